//! Merging per-locale text into locale bags

use crate::entity::{Corpus, Entity, RawCorpus, RawDocument, RawShape};
use crate::error::{Diagnostics, Staged, Warning};
use crate::locale::{clean_text, LocaleBag, LocaleConfig};
use crate::rules::BuildRules;
use crate::tags::{GameTag, TagCode, TagValue};
use std::collections::{BTreeMap, BTreeSet};

/// Build a corpus from normalized raw documents
///
/// Builds before localization keep primary locale text only, whatever the
/// shape of their documents.
pub fn merge_locales(
    raw: RawCorpus,
    rules: &BuildRules,
    locales: &LocaleConfig,
) -> Staged<Corpus> {
    let mut diagnostics = Diagnostics::new();
    let mut corpus = match raw.shape {
        RawShape::PerLocale => {
            merge_per_locale(raw.build, raw.documents, locales, &mut diagnostics)
        }
        RawShape::Consolidated => {
            merge_consolidated(raw.build, raw.documents, locales, &mut diagnostics)
        }
    };

    for entity in corpus.entities.values_mut() {
        for (code, bag) in entity.strings.iter_mut() {
            bag.normalize(locales);
            if rules.is_localized() {
                continue;
            }
            let had_text = !bag.is_empty();
            bag.collapse_to_primary(locales);
            if had_text && bag.is_empty() {
                diagnostics.warn(Warning::NoPrimaryText {
                    card_id: entity.id.clone(),
                    tag: code.to_string(),
                });
            }
        }
        entity.strings.retain(|_, bag| !bag.is_empty());
    }

    tracing::info!("merged locales for {} entities", corpus.len());
    diagnostics.finish(corpus)
}

fn merge_per_locale(
    build: u32,
    mut documents: Vec<RawDocument>,
    locales: &LocaleConfig,
    diagnostics: &mut Diagnostics,
) -> Corpus {
    documents.retain(|doc| match &doc.locale {
        Some(locale) if locales.is_disabled(locale) => {
            tracing::info!("skipping disabled locale document {:?}", doc.name);
            false
        }
        _ => true,
    });
    documents.sort_by(|a, b| {
        let a = a.locale.as_deref().unwrap_or(&locales.primary);
        let b = b.locale.as_deref().unwrap_or(&locales.primary);
        locales.sort_key(a).cmp(&locales.sort_key(b))
    });

    let mut corpus = Corpus::new(build);
    // String tags each entity was established with
    let mut baseline: BTreeMap<String, BTreeSet<TagCode>> = BTreeMap::new();

    for doc in documents {
        let locale = doc.locale.unwrap_or_else(|| locales.primary.clone());
        let mut seen = BTreeSet::new();

        for raw in doc.entities {
            if !seen.insert(raw.id.clone()) {
                diagnostics.warn(Warning::DuplicateEntity {
                    card_id: raw.id,
                    document: doc.name.clone(),
                });
                continue;
            }

            match corpus.get_mut(&raw.id) {
                Some(entity) => {
                    let Some(tags) = baseline.get(&raw.id) else {
                        continue;
                    };
                    for &code in tags {
                        if code == GameTag::ARTISTNAME {
                            continue;
                        }
                        if let Some(text) = raw.fragment(code, &locale) {
                            add_text(entity, code, &locale, text);
                        }
                    }
                }
                None => {
                    if !locales.is_primary(&locale) {
                        diagnostics.warn(Warning::MissingPrimaryLocale {
                            card_id: raw.id.clone(),
                            locale: locale.clone(),
                        });
                    }
                    let mut entity = raw.to_entity();
                    let tags: BTreeSet<TagCode> = raw.strings.keys().copied().collect();
                    for &code in &tags {
                        if let Some(text) = raw.fragment(code, &locale) {
                            add_text(&mut entity, code, &locale, text);
                        }
                    }
                    baseline.insert(raw.id.clone(), tags);
                    corpus.insert(entity);
                }
            }
        }
    }

    corpus
}

fn merge_consolidated(
    build: u32,
    documents: Vec<RawDocument>,
    locales: &LocaleConfig,
    diagnostics: &mut Diagnostics,
) -> Corpus {
    let mut corpus = Corpus::new(build);

    for doc in documents {
        for raw in doc.entities {
            if corpus.contains(&raw.id) {
                diagnostics.warn(Warning::DuplicateEntity {
                    card_id: raw.id,
                    document: doc.name.clone(),
                });
                continue;
            }

            let mut entity = raw.to_entity();
            for (&code, fragments) in &raw.strings {
                if code == GameTag::ARTISTNAME {
                    let artist = fragments
                        .iter()
                        .find(|(l, _)| locales.is_primary(l))
                        .or_else(|| fragments.first());
                    if let Some((locale, text)) = artist {
                        add_text(&mut entity, code, locale, text);
                    }
                    continue;
                }

                let mut bag = LocaleBag::new();
                for (locale, text) in fragments {
                    let text = clean_text(text);
                    if !text.is_empty() {
                        bag.insert(locale.as_str(), text);
                    }
                }
                if !bag.is_empty() {
                    entity.strings.insert(code, bag);
                }
            }
            corpus.insert(entity);
        }
    }

    corpus
}

/// Add one cleaned fragment; the artist is a plain scalar
fn add_text(entity: &mut Entity, code: TagCode, locale: &str, text: &str) {
    let text = clean_text(text);
    if text.is_empty() {
        return;
    }
    if code == GameTag::ARTISTNAME {
        entity.tags.insert(code, TagValue::Str(text));
    } else {
        entity.strings.entry(code).or_default().insert(locale, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize, SourceDocument};
    use crate::xml::parse_document;

    fn merged(build: u32, docs: &[(&str, &str)]) -> Staged<Corpus> {
        let rules = BuildRules::for_build(build);
        let locales = LocaleConfig::default();
        let documents = docs
            .iter()
            .map(|(name, xml)| SourceDocument::new(*name, parse_document(xml, name).unwrap()))
            .collect();
        let raw = normalize(documents, &rules, &locales).unwrap();
        merge_locales(raw, &rules, &locales)
    }

    fn card(id: &str, name: &str, text: &str, extra: &str) -> String {
        format!(
            r#"<CardDefs><Entity CardID="{id}" version="2">
                <Tag enumID="185" type="String">{name}</Tag>
                <Tag enumID="184" type="String">{text}</Tag>
                <Tag enumID="342" type="String">Artist {name}</Tag>
                {extra}
            </Entity></CardDefs>"#
        )
    }

    #[test]
    fn test_per_locale_merge_primary_first() {
        let cost = |value: u32| format!(r#"<Tag enumID="48" type="Int" value="{value}"/>"#);
        let en = card("CS2_029", "Fireball", "Deal $6 damage.", &cost(4));
        let fr = card("CS2_029", "Boule de feu", "Inflige $6 points.", &cost(9));
        let de = card("CS2_029", "Feuerball", "  ", "");
        let gb = card("CS2_029", "Fireball (GB)", "x", "");
        // Supplied out of order on purpose
        let staged = merged(
            4217,
            &[("frFR", &fr), ("enGB", &gb), ("deDE", &de), ("enUS", &en)],
        );

        assert!(staged.warnings.is_empty());
        let entity = staged.value.get("CS2_029").unwrap();
        let name = &entity.strings[&TagCode::from(GameTag::CARDNAME)];
        let locales: Vec<&str> = name.locales().collect();
        assert_eq!(locales, vec!["enUS", "deDE", "frFR"]);

        // Blank German text is not added
        let text = &entity.strings[&TagCode::from(GameTag::CARDTEXT_INHAND)];
        assert_eq!(text.locales().collect::<Vec<_>>(), vec!["enUS", "frFR"]);

        // Scalars come from the primary document only
        assert_eq!(entity.tag(GameTag::COST), 4);
        assert_eq!(
            entity.tags[&TagCode::from(GameTag::ARTISTNAME)],
            TagValue::Str("Artist Fireball".to_string())
        );
        assert!(!entity.strings.contains_key(&TagCode::from(GameTag::ARTISTNAME)));
    }

    #[test]
    fn test_per_locale_ignores_tags_missing_from_baseline() {
        let en = r#"<CardDefs><Entity CardID="A" version="1">
            <Tag enumID="185" type="String">Name</Tag>
        </Entity></CardDefs>"#;
        let fr = r#"<CardDefs><Entity CardID="A" version="1">
            <Tag enumID="185" type="String">Nom</Tag>
            <Tag enumID="351" type="String">Saveur</Tag>
        </Entity></CardDefs>"#;
        let staged = merged(4217, &[("enUS", en), ("frFR", fr)]);
        let entity = staged.value.get("A").unwrap();
        assert!(!entity.strings.contains_key(&TagCode::from(GameTag::FLAVORTEXT)));
    }

    #[test]
    fn test_entity_missing_from_primary_warns() {
        let en = r#"<CardDefs><Entity CardID="A" version="1"/></CardDefs>"#;
        let fr = r#"<CardDefs><Entity CardID="B" version="1">
            <Tag enumID="185" type="String">Nom</Tag>
        </Entity></CardDefs>"#;
        let staged = merged(4217, &[("enUS", en), ("frFR", fr)]);

        assert_eq!(staged.value.len(), 2);
        assert!(matches!(staged.warnings[0], Warning::MissingPrimaryLocale { .. }));
    }

    #[test]
    fn test_duplicate_entity_keeps_first() {
        let en = r#"<CardDefs>
            <Entity CardID="A" version="1"><Tag enumID="48" type="Int" value="1"/></Entity>
            <Entity CardID="A" version="1"><Tag enumID="48" type="Int" value="2"/></Entity>
        </CardDefs>"#;
        let staged = merged(4217, &[("enUS", en)]);
        assert_eq!(staged.value.get("A").unwrap().tag(GameTag::COST), 1);
        assert!(matches!(staged.warnings[0], Warning::DuplicateEntity { .. }));
    }

    #[test]
    fn test_consolidated_sorts_and_unescapes() {
        let xml = r#"<CardDefs><Entity CardID="A" version="1">
            <Tag enumID="184" type="String"><ptPT>x</ptPT><frFR> Inflige\n2 </frFR><enUS>Deal\n2</enUS></Tag>
        </Entity></CardDefs>"#;
        let staged = merged(4217, &[("cardxml0", xml)]);
        let bag = &staged.value.get("A").unwrap().strings[&TagCode(184)];

        assert_eq!(bag.locales().collect::<Vec<_>>(), vec!["enUS", "frFR"]);
        assert_eq!(bag.get("frFR"), Some("Inflige\n2"));
    }

    #[test]
    fn test_pre_localization_collapses_to_primary() {
        let xml = r#"<CardDefs><Entity CardID="A" version="1">
            <Tag enumID="185" type="String"><enUS>Fireball</enUS><deDE>Feuerball</deDE></Tag>
        </Entity></CardDefs>"#;
        let staged = merged(3388, &[("cardxml0", xml)]);
        let bag = &staged.value.get("A").unwrap().strings[&TagCode(185)];
        assert_eq!(bag, &LocaleBag::single("enUS", "Fireball"));
    }

    #[test]
    fn test_per_locale_pre_localization_collapses_to_primary() {
        let en = card("CS2_029", "Fireball", "Deal $6 damage.", "");
        let de = card("CS2_029", "Feuerball", "Verursacht $6 Schaden.", "");
        let staged = merged(3000, &[("enUS", &en), ("deDE", &de)]);

        assert!(staged.warnings.is_empty());
        let entity = staged.value.get("CS2_029").unwrap();
        assert_eq!(
            entity.strings[&TagCode::from(GameTag::CARDNAME)],
            LocaleBag::single("enUS", "Fireball")
        );
        assert_eq!(
            entity.strings[&TagCode::from(GameTag::CARDTEXT_INHAND)],
            LocaleBag::single("enUS", "Deal $6 damage.")
        );
    }

    #[test]
    fn test_pre_localization_without_primary_text_warns() {
        let en = r#"<CardDefs><Entity CardID="A" version="1"/></CardDefs>"#;
        let de = card("B", "Feuerball", "Verursacht $6 Schaden.", "");
        let staged = merged(3000, &[("enUS", en), ("deDE", &de)]);

        let entity = staged.value.get("B").unwrap();
        assert!(!entity.strings.contains_key(&TagCode::from(GameTag::CARDNAME)));
        assert!(staged
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::NoPrimaryText { .. })));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let en = card("CS2_029", "Fireball", "Deal $6 damage.", "");
        let fr = card("CS2_029", "Boule de feu", "Inflige $6 points.", "");
        let first = merged(4217, &[("enUS", &en), ("frFR", &fr)]).value;
        let second = merged(4217, &[("frFR", &fr), ("enUS", &en)]).value;
        assert_eq!(first, second);
    }
}
