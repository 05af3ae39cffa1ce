//! Tags derived from description text and ids

use crate::entity::{Corpus, Entity};
use crate::error::{Diagnostics, Staged, Warning};
use crate::locale::LocaleConfig;
use crate::rules::BuildRules;
use crate::tags::{GameTag, TagValue};
use regex::Regex;
use std::sync::LazyLock;

static OVERLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Overload[^(]+\((\d+)\)").unwrap());

static SPELL_POWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Spell (?:Power|Damage)(?:</b>)? \+(\d+)").unwrap());

static SPARE_PART_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^PART_\d+").unwrap());

const CANT_ATTACK_PHRASES: &[&str] = &["Can't attack.", "Can't Attack."];

/// Result of one enrichment pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enriched {
    pub corpus: Corpus,
    /// Number of tag values that changed
    pub changed: usize,
}

/// Apply every derivation rule to every entity
pub fn enrich(mut corpus: Corpus, rules: &BuildRules, locales: &LocaleConfig) -> Staged<Enriched> {
    let mut diagnostics = Diagnostics::new();
    let mut changed = 0;

    for entity in corpus.entities.values_mut() {
        changed += enrich_entity(entity, rules, &locales.primary, &mut diagnostics);
    }

    tracing::info!("enrichment changed {} tag values", changed);
    diagnostics.finish(Enriched { corpus, changed })
}

fn enrich_entity(
    entity: &mut Entity,
    rules: &BuildRules,
    primary: &str,
    diagnostics: &mut Diagnostics,
) -> usize {
    let description = entity
        .text(GameTag::CARDTEXT_INHAND, primary)
        .unwrap_or_default()
        .to_string();
    let mut changed = 0;

    if entity.tag(GameTag::OVERLOAD) != 0 {
        match capture_amount(&OVERLOAD_RE, &description) {
            Some(amount) => {
                changed += usize::from(entity.set_tag(GameTag::OVERLOAD, TagValue::Int(amount)))
            }
            None => diagnostics.warn(Warning::NoOverloadAmount {
                card_id: entity.id.clone(),
                description: description.clone(),
            }),
        }
    }

    if entity.tag(GameTag::SPELLPOWER) != 0 {
        match capture_amount(&SPELL_POWER_RE, &description) {
            Some(amount) => {
                changed += usize::from(entity.set_tag(GameTag::SPELLPOWER, TagValue::Int(amount)))
            }
            None => diagnostics.warn(Warning::NoSpellPowerAmount {
                card_id: entity.id.clone(),
                description: description.clone(),
            }),
        }
    }

    let mut flags = Vec::new();
    if description.contains(rules.untargetable_phrase) {
        flags.push(GameTag::CANT_BE_TARGETED_BY_SPELLS);
        flags.push(GameTag::CANT_BE_TARGETED_BY_HERO_POWERS);
    }
    if CANT_ATTACK_PHRASES.iter().any(|p| description.contains(p)) {
        flags.push(GameTag::CANT_ATTACK);
    }
    if SPARE_PART_RE.is_match(&entity.id) {
        flags.push(GameTag::SPARE_PART);
    }
    for tag in flags {
        changed += usize::from(entity.set_tag(tag, TagValue::Bool(true)));
    }

    changed
}

fn capture_amount(re: &Regex, description: &str) -> Option<i64> {
    re.captures(description)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocaleBag;

    fn entity(id: &str, description: &str) -> Entity {
        let mut entity = Entity::new(id);
        entity.strings.insert(
            GameTag::CARDTEXT_INHAND.into(),
            LocaleBag::single("enUS", description),
        );
        entity
    }

    fn run(entity: Entity, build: u32) -> Staged<Enriched> {
        let mut corpus = Corpus::new(build);
        corpus.insert(entity);
        enrich(corpus, &BuildRules::for_build(build), &LocaleConfig::default())
    }

    #[test]
    fn test_overload_amount() {
        let mut card = entity("EX1_238", "Deal $3 damage. Overload: (2)");
        card.set_tag(GameTag::OVERLOAD, TagValue::Int(1));
        let staged = run(card, 4217);

        let enriched = staged.value;
        assert_eq!(enriched.corpus.get("EX1_238").unwrap().tag(GameTag::OVERLOAD), 2);
        assert_eq!(enriched.changed, 1);
        assert!(staged.warnings.is_empty());
    }

    #[test]
    fn test_overload_without_amount_warns_and_keeps_value() {
        let mut card = entity("EX1_238", "Deal $3 damage.");
        card.set_tag(GameTag::OVERLOAD, TagValue::Int(1));
        let staged = run(card, 4217);

        assert_eq!(staged.value.corpus.get("EX1_238").unwrap().tag(GameTag::OVERLOAD), 1);
        assert!(matches!(staged.warnings[0], Warning::NoOverloadAmount { .. }));
    }

    #[test]
    fn test_overload_needs_text_before_amount() {
        let mut card = entity("EX1_238", "Deal $3 damage. Overload(2)");
        card.set_tag(GameTag::OVERLOAD, TagValue::Int(1));
        let staged = run(card, 4217);

        assert_eq!(staged.value.corpus.get("EX1_238").unwrap().tag(GameTag::OVERLOAD), 1);
        assert_eq!(staged.value.changed, 0);
        assert!(matches!(staged.warnings[0], Warning::NoOverloadAmount { .. }));
    }

    #[test]
    fn test_spell_power_amount() {
        let mut card = entity("CS2_142", "<b>Spell Damage</b> +1");
        card.set_tag(GameTag::SPELLPOWER, TagValue::Int(1));
        let mut malygos = entity("EX1_563", "Spell Damage +5");
        malygos.set_tag(GameTag::SPELLPOWER, TagValue::Int(1));

        let mut corpus = Corpus::new(4217);
        corpus.insert(card);
        corpus.insert(malygos);
        let staged = enrich(corpus, &BuildRules::for_build(4217), &LocaleConfig::default());

        let corpus = staged.value.corpus;
        assert_eq!(corpus.get("CS2_142").unwrap().tag(GameTag::SPELLPOWER), 1);
        assert_eq!(corpus.get("EX1_563").unwrap().tag(GameTag::SPELLPOWER), 5);
        assert!(staged.warnings.is_empty());
    }

    #[test]
    fn test_untargetable_phrase_depends_on_build() {
        let old = "Can't be targeted by Spells or Hero Powers.";
        let staged = run(entity("CS2_mirror", old), 5000);
        let card = staged.value.corpus.get("CS2_mirror").unwrap().clone();
        assert_eq!(card.tag(GameTag::CANT_BE_TARGETED_BY_SPELLS), 1);
        assert_eq!(card.tag(GameTag::CANT_BE_TARGETED_BY_HERO_POWERS), 1);
        assert_eq!(staged.value.changed, 2);

        // The old capitalization no longer matches from the threshold on
        let staged = run(entity("CS2_mirror", old), 6024);
        let card = staged.value.corpus.get("CS2_mirror").unwrap();
        assert_eq!(card.tag(GameTag::CANT_BE_TARGETED_BY_SPELLS), 0);

        let new = "Can't be targeted by spells or Hero Powers.";
        let staged = run(entity("CS2_mirror", new), 6024);
        let card = staged.value.corpus.get("CS2_mirror").unwrap();
        assert_eq!(card.tag(GameTag::CANT_BE_TARGETED_BY_HERO_POWERS), 1);
    }

    #[test]
    fn test_cant_attack_and_spare_parts() {
        let mut corpus = Corpus::new(4217);
        corpus.insert(entity("EX1_007", "Can't Attack."));
        corpus.insert(entity("PART_001", "Give a minion +1 Health."));
        corpus.insert(entity("XPART_001", ""));
        let staged = enrich(corpus, &BuildRules::for_build(4217), &LocaleConfig::default());
        let corpus = staged.value.corpus;

        assert_eq!(corpus.get("EX1_007").unwrap().tag(GameTag::CANT_ATTACK), 1);
        assert_eq!(corpus.get("PART_001").unwrap().tag(GameTag::SPARE_PART), 1);
        assert_eq!(corpus.get("XPART_001").unwrap().tag(GameTag::SPARE_PART), 0);
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let mut card = entity("PART_002", "Overload: (3). Can't attack.");
        card.set_tag(GameTag::OVERLOAD, TagValue::Int(1));
        let rules = BuildRules::for_build(4217);
        let locales = LocaleConfig::default();

        let mut corpus = Corpus::new(4217);
        corpus.insert(card);
        let first = enrich(corpus, &rules, &locales).value;
        assert_eq!(first.changed, 3);

        let second = enrich(first.corpus.clone(), &rules, &locales).value;
        assert_eq!(second.changed, 0);
        assert_eq!(second.corpus, first.corpus);
    }
}
