//! Merge relational overrides into a corpus
//!
//! Relational exports take precedence over what the card documents say:
//! tag rows overwrite tags, and localized columns replace whole bags.

use crate::entity::Corpus;
use crate::error::{Diagnostics, Staged, Warning};
use crate::locale::{clean_text, LocaleBag, LocaleConfig};
use crate::records::{CardRecord, CardTagRecord};
use crate::tags::{GameTag, TagValue};

/// Write CARD_TAG rows as owned or referenced tags
pub fn merge_tag_records(mut corpus: Corpus, records: &[CardTagRecord]) -> Staged<Corpus> {
    let mut diagnostics = Diagnostics::new();
    let mut merged = 0;

    for record in records {
        let Some(entity) = corpus.get_mut(&record.card_id) else {
            diagnostics.warn(Warning::UnknownCard {
                card_id: record.card_id.clone(),
                table: "CARD_TAG".to_string(),
            });
            continue;
        };

        let value = TagValue::from_raw(record.tag, record.value);
        if record.is_reference {
            entity.referenced_tags.insert(record.tag, value);
        } else {
            entity.tags.insert(record.tag, value);
        }
        merged += 1;
    }

    tracing::info!("merged {} tag override rows", merged);
    diagnostics.finish(corpus)
}

/// Replace string tags with the CARD table's localized columns.
///
/// The export carries one locale per row, so every bag written here holds the
/// primary locale only. The artist is written as a scalar. An empty column
/// removes the tag.
pub fn merge_localized_columns(
    mut corpus: Corpus,
    records: &[CardRecord],
    locales: &LocaleConfig,
) -> Corpus {
    let mut replaced = 0;

    for record in records {
        let Some(columns) = &record.localized else {
            continue;
        };
        let Some(entity) = corpus.get_mut(&record.short_id) else {
            // Reported by the identifier resolver
            continue;
        };

        for (&tag, text) in columns {
            let text = clean_text(text);
            if tag == GameTag::ARTISTNAME {
                if text.is_empty() {
                    entity.tags.remove(&tag);
                } else {
                    entity.tags.insert(tag, TagValue::Str(text));
                }
            } else if text.is_empty() {
                entity.strings.remove(&tag);
            } else {
                entity
                    .strings
                    .insert(tag, LocaleBag::single(locales.primary.as_str(), text));
            }
        }
        replaced += 1;
    }

    tracing::info!("merged localized columns for {} cards", replaced);
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::tags::TagCode;
    use std::collections::BTreeMap;

    fn corpus_with_fireball() -> Corpus {
        let mut entity = Entity::new("CS2_029");
        let mut name = LocaleBag::new();
        name.insert("enUS", "Fireball");
        name.insert("frFR", "Boule de feu");
        entity.strings.insert(GameTag::CARDNAME.into(), name);
        entity
            .strings
            .insert(GameTag::FLAVORTEXT.into(), LocaleBag::single("enUS", "Hot."));
        entity.set_tag(GameTag::COST, TagValue::Int(4));

        let mut corpus = Corpus::new(15590);
        corpus.insert(entity);
        corpus
    }

    fn tag_record(card_id: &str, tag: u32, value: i64, is_reference: bool) -> CardTagRecord {
        CardTagRecord {
            card_id: card_id.to_string(),
            tag: TagCode(tag),
            value,
            is_reference,
            is_power_keyword: false,
        }
    }

    #[test]
    fn test_tag_rows_override_owned_tags() {
        let records = vec![
            tag_record("CS2_029", 48, 5, false),
            tag_record("CS2_029", 190, 1, false),
        ];
        let staged = merge_tag_records(corpus_with_fireball(), &records);
        let entity = staged.value.get("CS2_029").unwrap();

        assert_eq!(entity.tag(GameTag::COST), 5);
        assert_eq!(entity.tags[&TagCode(190)], TagValue::Bool(true));
        assert!(staged.warnings.is_empty());
    }

    #[test]
    fn test_reference_rows_become_referenced_tags() {
        let records = vec![tag_record("CS2_029", 215, 1, true)];
        let staged = merge_tag_records(corpus_with_fireball(), &records);
        let entity = staged.value.get("CS2_029").unwrap();

        assert_eq!(entity.referenced_tags[&TagCode(215)], TagValue::Int(1));
        assert!(!entity.tags.contains_key(&TagCode(215)));
    }

    #[test]
    fn test_tag_rows_for_unknown_entities_warn() {
        let records = vec![tag_record("GHOST_01", 48, 1, false)];
        let staged = merge_tag_records(corpus_with_fireball(), &records);
        assert_eq!(staged.warnings.len(), 1);
    }

    #[test]
    fn test_localized_columns_replace_bags() {
        let mut columns = BTreeMap::new();
        columns.insert(TagCode::from(GameTag::CARDNAME), "Fireball!".to_string());
        columns.insert(TagCode::from(GameTag::FLAVORTEXT), String::new());
        columns.insert(TagCode::from(GameTag::ARTISTNAME), "Ralph Horsley".to_string());
        let records = vec![CardRecord {
            id: 315,
            short_id: "CS2_029".to_string(),
            long_id: None,
            hero_power_id: None,
            localized: Some(columns),
        }];

        let merged =
            merge_localized_columns(corpus_with_fireball(), &records, &LocaleConfig::default());
        let entity = merged.get("CS2_029").unwrap();

        assert_eq!(
            entity.strings[&TagCode::from(GameTag::CARDNAME)],
            LocaleBag::single("enUS", "Fireball!")
        );
        assert!(!entity.strings.contains_key(&TagCode::from(GameTag::FLAVORTEXT)));
        assert_eq!(
            entity.tags[&TagCode::from(GameTag::ARTISTNAME)],
            TagValue::Str("Ralph Horsley".to_string())
        );
        assert!(!entity.strings.contains_key(&TagCode::from(GameTag::ARTISTNAME)));
    }

    #[test]
    fn test_records_without_localized_columns_leave_strings() {
        let records = vec![CardRecord {
            id: 315,
            short_id: "CS2_029".to_string(),
            long_id: None,
            hero_power_id: None,
            localized: None,
        }];
        let before = corpus_with_fireball();
        let merged = merge_localized_columns(before.clone(), &records, &LocaleConfig::default());
        assert_eq!(merged, before);
    }

    #[test]
    fn test_localized_columns_for_absent_card_are_skipped() {
        let mut columns = BTreeMap::new();
        columns.insert(TagCode::from(GameTag::CARDNAME), "Frostbolt".to_string());
        let records = vec![CardRecord {
            id: 662,
            short_id: "CS2_024".to_string(),
            long_id: None,
            hero_power_id: None,
            localized: Some(columns),
        }];
        let before = corpus_with_fireball();
        let merged = merge_localized_columns(before.clone(), &records, &LocaleConfig::default());
        assert_eq!(merged, before);
        assert!(!merged.contains("CS2_024"));
    }
}
