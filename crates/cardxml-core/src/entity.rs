//! Canonical entities and the raw records they are built from

use crate::locale::LocaleBag;
use crate::tags::{GameTag, TagCode, TagValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A play requirement attached to a power
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRequirement {
    pub req_id: u32,
    pub param: Option<String>,
}

/// A power definition, carried through untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Power {
    pub definition: String,
    pub requirements: Vec<PlayRequirement>,
}

/// One `TriggeredPowerHistoryInfo` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredPowerHistory {
    pub effect_index: String,
    pub show_in_history: bool,
}

/// The canonical record of one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Short id
    pub id: String,
    pub dbf_id: Option<u32>,
    pub version: u32,
    pub master_power: Option<String>,
    /// Owned scalar tags
    pub tags: BTreeMap<TagCode, TagValue>,
    /// Localized string tags
    pub strings: BTreeMap<TagCode, LocaleBag>,
    pub referenced_tags: BTreeMap<TagCode, TagValue>,
    pub powers: Vec<Power>,
    /// Short ids once resolved
    pub entourage: Vec<String>,
    pub triggered_power_history: Vec<TriggeredPowerHistory>,
    /// Short id of the hero power entity
    pub hero_power: Option<String>,
    /// Portrait texture path
    pub texture: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dbf_id: None,
            version: 0,
            master_power: None,
            tags: BTreeMap::new(),
            strings: BTreeMap::new(),
            referenced_tags: BTreeMap::new(),
            powers: Vec::new(),
            entourage: Vec::new(),
            triggered_power_history: Vec::new(),
            hero_power: None,
            texture: None,
        }
    }

    /// Numeric value of an owned tag, zero when absent
    pub fn tag(&self, tag: GameTag) -> i64 {
        self.tags
            .get(&TagCode::from(tag))
            .map(TagValue::as_int)
            .unwrap_or(0)
    }

    /// Set an owned tag, returning whether the stored value changed
    pub fn set_tag(&mut self, tag: impl Into<TagCode>, value: TagValue) -> bool {
        let code = tag.into();
        if self.tags.get(&code) == Some(&value) {
            return false;
        }
        self.tags.insert(code, value);
        true
    }

    /// Text of a string tag in one locale
    pub fn text(&self, tag: GameTag, locale: &str) -> Option<&str> {
        self.strings.get(&TagCode::from(tag)).and_then(|bag| bag.get(locale))
    }

    /// Union of all play requirements, first occurrence of each id wins
    pub fn requirements(&self) -> BTreeMap<u32, Option<String>> {
        let mut requirements = BTreeMap::new();
        for power in &self.powers {
            for req in &power.requirements {
                requirements
                    .entry(req.req_id)
                    .or_insert_with(|| req.param.clone());
            }
        }
        requirements
    }
}

/// All entities of one build, keyed by short id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub build: u32,
    pub entities: BTreeMap<String, Entity>,
}

impl Corpus {
    pub fn new(build: u32) -> Self {
        Self {
            build,
            entities: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Entities in output order: case-insensitive by id, ties by exact id
    pub fn sorted(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.entities.values().collect();
        entities.sort_by(|a, b| {
            a.id.to_lowercase()
                .cmp(&b.id.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        entities
    }
}

/// One entity as read from a raw document, before locale merging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntity {
    pub id: String,
    pub dbf_id: Option<u32>,
    pub version: u32,
    pub master_power: Option<String>,
    pub tags: BTreeMap<TagCode, TagValue>,
    /// Text fragments per string tag as `(locale, text)`, untrimmed, in document order
    pub strings: BTreeMap<TagCode, Vec<(String, String)>>,
    pub referenced_tags: BTreeMap<TagCode, TagValue>,
    pub powers: Vec<Power>,
    pub entourage: Vec<String>,
    pub triggered_power_history: Vec<TriggeredPowerHistory>,
    /// Only present when reading a canonical document back
    pub hero_power: Option<String>,
    pub texture: Option<String>,
}

impl RawEntity {
    /// Entity carrying every non-string field; strings are left to the caller
    pub fn to_entity(&self) -> Entity {
        Entity {
            id: self.id.clone(),
            dbf_id: self.dbf_id,
            version: self.version,
            master_power: self.master_power.clone(),
            tags: self.tags.clone(),
            strings: BTreeMap::new(),
            referenced_tags: self.referenced_tags.clone(),
            powers: self.powers.clone(),
            entourage: self.entourage.clone(),
            triggered_power_history: self.triggered_power_history.clone(),
            hero_power: self.hero_power.clone(),
            texture: self.texture.clone(),
        }
    }

    /// First fragment of `tag` in `locale`
    pub fn fragment(&self, tag: TagCode, locale: &str) -> Option<&str> {
        self.strings
            .get(&tag)?
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, t)| t.as_str())
    }
}

/// The two raw shapes a run can start from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawShape {
    /// One single-language document per locale
    PerLocale,
    /// Every entity already carries all its locales
    Consolidated,
}

/// Entities of one source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Document name as supplied
    pub name: String,
    /// Locale of every fragment in a per-locale document
    pub locale: Option<String>,
    pub entities: Vec<RawEntity>,
}

/// Normalized input to the locale merger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCorpus {
    pub build: u32,
    pub shape: RawShape,
    pub documents: Vec<RawDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_is_case_insensitive() {
        let mut corpus = Corpus::new(1);
        for id in ["EX1_b", "ex1_A", "CS2_029", "cs2_030"] {
            corpus.insert(Entity::new(id));
        }
        let ids: Vec<&str> = corpus.sorted().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["CS2_029", "cs2_030", "ex1_A", "EX1_b"]);
    }

    #[test]
    fn test_set_tag_reports_change() {
        let mut entity = Entity::new("CS2_029");
        assert!(entity.set_tag(GameTag::COST, TagValue::Int(4)));
        assert!(!entity.set_tag(GameTag::COST, TagValue::Int(4)));
        assert_eq!(entity.tag(GameTag::COST), 4);
        assert_eq!(entity.tag(GameTag::ATK), 0);
    }

    #[test]
    fn test_requirements_first_occurrence_wins() {
        let mut entity = Entity::new("CS2_022");
        entity.powers.push(Power {
            definition: "a".to_string(),
            requirements: vec![PlayRequirement {
                req_id: 1,
                param: None,
            }],
        });
        entity.powers.push(Power {
            definition: "b".to_string(),
            requirements: vec![
                PlayRequirement {
                    req_id: 1,
                    param: Some("5".to_string()),
                },
                PlayRequirement {
                    req_id: 48,
                    param: None,
                },
            ],
        });

        let reqs = entity.requirements();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[&1], None);
        assert!(reqs.contains_key(&48));
    }
}
