//! Cross-reference maps and identifier rewriting

use crate::entity::Corpus;
use crate::error::{Diagnostics, Error, Result, Staged, Warning};
use crate::records::CardRecord;
use crate::tags::{GameTag, TagValue};
use std::collections::{BTreeMap, BTreeSet};

/// Hero powers missing from the CARD export: hero short id -> hero power numeric id
pub const MISSING_HERO_POWERS: &[(&str, u32)] = &[
    ("BRM_027h", 2319), // BRM_027p
    ("EX1_323h", 1178), // EX1_tk33
];

/// References at least this long are long ids
pub const LONG_ID_MIN_LEN: usize = 34;

/// The default hero power override table
pub fn default_hero_power_overrides() -> BTreeMap<String, u32> {
    MISSING_HERO_POWERS
        .iter()
        .map(|(id, dbf_id)| (id.to_string(), *dbf_id))
        .collect()
}

/// Lookups built from the CARD table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMaps {
    /// Numeric id -> short id
    pub short_ids: BTreeMap<u32, String>,
    /// Long id -> short id
    pub long_ids: BTreeMap<String, String>,
    /// Numeric id -> numeric hero power id
    pub hero_powers: BTreeMap<u32, u32>,
}

impl IdMaps {
    pub fn from_records(records: &[CardRecord]) -> Self {
        let mut maps = Self::default();
        for record in records {
            maps.short_ids.insert(record.id, record.short_id.clone());
            if let Some(long_id) = &record.long_id {
                maps.long_ids.insert(long_id.clone(), record.short_id.clone());
            }
            if let Some(hero_power_id) = record.hero_power_id {
                maps.hero_powers.insert(record.id, hero_power_id);
            }
        }
        maps
    }

    pub fn short_id(&self, dbf_id: u32) -> Option<&str> {
        self.short_ids.get(&dbf_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.short_ids.is_empty()
    }
}

/// Stamp numeric ids and rewrite hero power and entourage references.
///
/// Fails if an override in `hero_power_overrides` is also resolved from the
/// table: the override table is stale and has to be fixed.
pub fn resolve_identifiers(
    mut corpus: Corpus,
    maps: &IdMaps,
    hero_power_overrides: &BTreeMap<String, u32>,
) -> Result<Staged<Corpus>> {
    let mut diagnostics = Diagnostics::new();

    for (&dbf_id, card_id) in &maps.short_ids {
        let Some(entity) = corpus.get_mut(card_id) else {
            diagnostics.warn(Warning::UnknownCard {
                card_id: card_id.clone(),
                table: "CARD".to_string(),
            });
            continue;
        };
        entity.dbf_id = Some(dbf_id);
        if let Some(&hero_power_id) = maps.hero_powers.get(&dbf_id) {
            entity.set_tag(GameTag::HERO_POWER, TagValue::Int(i64::from(hero_power_id)));
        }
    }

    for (card_id, &override_id) in hero_power_overrides {
        let Some(entity) = corpus.get_mut(card_id) else {
            tracing::debug!("hero power override for absent entity {:?}", card_id);
            continue;
        };

        // Any hero power already present, even the same one, makes the override stale
        let found_id = entity.tag(GameTag::HERO_POWER);
        if found_id != 0 {
            return Err(Error::OverrideConflict {
                card_id: card_id.clone(),
                override_id,
                found_id,
            });
        }

        entity.set_tag(GameTag::HERO_POWER, TagValue::Int(i64::from(override_id)));
    }

    let known: BTreeSet<String> = corpus.entities.keys().cloned().collect();

    for entity in corpus.entities.values_mut() {
        let hero_power = entity.tag(GameTag::HERO_POWER);
        if hero_power != 0 {
            match u32::try_from(hero_power).ok().and_then(|id| maps.short_id(id)) {
                Some(short_id) => entity.hero_power = Some(short_id.to_string()),
                None => diagnostics.warn(Warning::UnresolvedHeroPower {
                    card_id: entity.id.clone(),
                    dbf_id: hero_power,
                }),
            }
        }

        for reference in entity.entourage.iter_mut() {
            if reference.len() < LONG_ID_MIN_LEN {
                continue;
            }
            match maps.long_ids.get(reference.as_str()) {
                Some(short_id) if known.contains(short_id) => *reference = short_id.clone(),
                _ => diagnostics.warn(Warning::UnresolvedLongId {
                    card_id: entity.id.clone(),
                    long_id: reference.clone(),
                }),
            }
        }
    }

    tracing::info!(
        "resolved identifiers against {} card records",
        maps.short_ids.len()
    );
    Ok(diagnostics.finish(corpus))
}

/// Attach portrait texture paths by short id. Empty paths mean "no texture".
pub fn link_textures(mut corpus: Corpus, textures: &BTreeMap<String, String>) -> Staged<Corpus> {
    let mut diagnostics = Diagnostics::new();

    for (card_id, path) in textures {
        let path = path.trim();
        if path.is_empty() {
            tracing::debug!("{:?} does not have a texture", card_id);
            continue;
        }
        match corpus.get_mut(card_id) {
            Some(entity) => entity.texture = Some(path.to_string()),
            None => diagnostics.warn(Warning::UnknownTexture {
                card_id: card_id.clone(),
            }),
        }
    }

    diagnostics.finish(corpus)
}
