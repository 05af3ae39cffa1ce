//! Structural comparison of two finished corpora

use crate::entity::{Corpus, Entity};
use crate::locale::LocaleBag;
use crate::tags::{TagCode, TagValue};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An old/new pair; `old` is absent for additions, `new` for deletions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change<T> {
    pub old: Option<T>,
    pub new: Option<T>,
}

/// Text carried by a tag, either plain or per locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TextValue {
    Scalar(String),
    Localized(LocaleBag),
}

impl fmt::Display for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextValue::Scalar(text) => write!(f, "{:?}", text),
            TextValue::Localized(bag) => {
                let entries: Vec<String> = bag
                    .iter()
                    .map(|(locale, text)| format!("{}: {:?}", locale, text))
                    .collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}

/// Everything that changed about one entity present on both sides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityDiff {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<TagCode, Change<TagValue>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub text: BTreeMap<TagCode, Change<TextValue>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub referenced_tags: BTreeMap<TagCode, Change<TagValue>>,
    /// Requirement id to parameter; a requirement without one has an empty parameter
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub requirements: BTreeMap<u32, Change<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_power: Option<Change<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entourage_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entourage_removed: Vec<String>,
}

impl EntityDiff {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.text.is_empty()
            && self.referenced_tags.is_empty()
            && self.requirements.is_empty()
            && self.hero_power.is_none()
            && self.entourage_added.is_empty()
            && self.entourage_removed.is_empty()
    }
}

/// Differences between a "before" and an "after" corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: BTreeMap<String, EntityDiff>,
    /// Tag codes no "before" entity carries
    pub new_tags: Vec<TagCode>,
    pub new_referenced_tags: Vec<TagCode>,
    pub new_requirements: Vec<u32>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.new_tags.is_empty()
            && self.new_referenced_tags.is_empty()
            && self.new_requirements.is_empty()
    }
}

/// Compare two corpora
pub fn diff(before: &Corpus, after: &Corpus) -> ChangeReport {
    let mut report = ChangeReport::default();

    for (id, new) in &after.entities {
        match before.get(id) {
            None => report.added.push(id.clone()),
            Some(old) => {
                let entity_diff = diff_entity(old, new);
                if !entity_diff.is_empty() {
                    report.changed.insert(id.clone(), entity_diff);
                }
            }
        }
    }
    report.removed = before
        .entities
        .keys()
        .filter(|id| !after.contains(id))
        .cloned()
        .collect();

    report.new_tags = novel(before, after, |e| {
        e.tags.keys().chain(e.strings.keys()).copied().collect()
    });
    report.new_referenced_tags = novel(before, after, |e| {
        e.referenced_tags.keys().copied().collect()
    });
    report.new_requirements = novel(before, after, |e| e.requirements().into_keys().collect());

    tracing::info!(
        "{} added, {} removed, {} changed",
        report.added.len(),
        report.removed.len(),
        report.changed.len()
    );
    report
}

/// Compare two versions of one entity
pub fn diff_entity(old: &Entity, new: &Entity) -> EntityDiff {
    let hero_power = (old.hero_power != new.hero_power).then(|| Change {
        old: old.hero_power.clone(),
        new: new.hero_power.clone(),
    });

    let old_entourage: BTreeSet<&String> = old.entourage.iter().collect();
    let new_entourage: BTreeSet<&String> = new.entourage.iter().collect();

    EntityDiff {
        tags: diff_maps(&scalar_tags(old), &scalar_tags(new)),
        text: diff_maps(&text_tags(old), &text_tags(new)),
        referenced_tags: diff_maps(&old.referenced_tags, &new.referenced_tags),
        requirements: diff_maps(&requirements(old), &requirements(new)),
        hero_power,
        entourage_added: new_entourage
            .difference(&old_entourage)
            .map(|id| id.to_string())
            .collect(),
        entourage_removed: old_entourage
            .difference(&new_entourage)
            .map(|id| id.to_string())
            .collect(),
    }
}

fn scalar_tags(entity: &Entity) -> BTreeMap<TagCode, TagValue> {
    entity
        .tags
        .iter()
        .filter(|(_, value)| !value.is_text())
        .map(|(code, value)| (*code, value.clone()))
        .collect()
}

fn text_tags(entity: &Entity) -> BTreeMap<TagCode, TextValue> {
    let scalars = entity.tags.iter().filter_map(|(code, value)| match value {
        TagValue::Str(text) => Some((*code, TextValue::Scalar(text.clone()))),
        _ => None,
    });
    let bags = entity
        .strings
        .iter()
        .map(|(code, bag)| (*code, TextValue::Localized(bag.clone())));
    scalars.chain(bags).collect()
}

fn requirements(entity: &Entity) -> BTreeMap<u32, String> {
    entity
        .requirements()
        .into_iter()
        .map(|(id, param)| (id, param.unwrap_or_default()))
        .collect()
}

fn diff_maps<K, V>(old: &BTreeMap<K, V>, new: &BTreeMap<K, V>) -> BTreeMap<K, Change<V>>
where
    K: Ord + Copy,
    V: Clone + PartialEq,
{
    let keys: BTreeSet<&K> = old.keys().chain(new.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let (a, b) = (old.get(key), new.get(key));
            (a != b).then(|| {
                (
                    *key,
                    Change {
                        old: a.cloned(),
                        new: b.cloned(),
                    },
                )
            })
        })
        .collect()
}

fn novel<K, F>(before: &Corpus, after: &Corpus, keys: F) -> Vec<K>
where
    K: Ord,
    F: Fn(&Entity) -> BTreeSet<K>,
{
    let seen: BTreeSet<K> = before.entities.values().flat_map(&keys).collect();
    let found: BTreeSet<K> = after.entities.values().flat_map(&keys).collect();
    found.into_iter().filter(|k| !seen.contains(k)).collect()
}

fn write_change<K: fmt::Display, T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    key: K,
    change: &Change<T>,
) -> fmt::Result {
    match (&change.old, &change.new) {
        (None, Some(new)) => writeln!(f, "  - ADDED {} = {}", key, new),
        (Some(old), None) => writeln!(f, "  - DELETED {} (was: {})", key, old),
        (Some(old), Some(new)) => writeln!(f, "  - CHANGED {}: {} -> {}", key, old, new),
        (None, None) => Ok(()),
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    items: &[T],
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "{} {}:", items.len(), title)?;
    let items: Vec<String> = items.iter().map(ToString::to_string).collect();
    writeln!(f, "{}", items.join(", "))?;
    writeln!(f)
}

impl fmt::Display for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, "new cards", &self.added)?;
        write_list(f, "deleted cards", &self.removed)?;

        if !self.changed.is_empty() {
            writeln!(f, "{} changed cards:", self.changed.len())?;
            for (id, entity_diff) in &self.changed {
                writeln!(f, "* {}", id)?;
                for (code, change) in &entity_diff.tags {
                    write_change(f, code, change)?;
                }
                for (code, change) in &entity_diff.text {
                    write_change(f, code, change)?;
                }
                for (code, change) in &entity_diff.referenced_tags {
                    write_change(f, format!("referenced {}", code), change)?;
                }
                for (id, change) in &entity_diff.requirements {
                    write_change(f, format!("requirement {}", id), change)?;
                }
                if let Some(change) = &entity_diff.hero_power {
                    write_change(f, "hero power", change)?;
                }
                if !entity_diff.entourage_added.is_empty()
                    || !entity_diff.entourage_removed.is_empty()
                {
                    writeln!(f, "  - UPDATED ENTOURAGE:")?;
                    if !entity_diff.entourage_added.is_empty() {
                        writeln!(f, "    * ADDED: {}", entity_diff.entourage_added.join(", "))?;
                    }
                    if !entity_diff.entourage_removed.is_empty() {
                        writeln!(f, "    * REMOVED: {}", entity_diff.entourage_removed.join(", "))?;
                    }
                }
            }
            writeln!(f)?;
        }

        write_list(f, "new tags", &self.new_tags)?;
        write_list(f, "new referenced tags", &self.new_referenced_tags)?;
        write_list(f, "new play requirements", &self.new_requirements)
    }
}
