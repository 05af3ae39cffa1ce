//! End-to-end reconciliation of one build

use crate::entity::Corpus;
use crate::enricher::enrich;
use crate::error::{Result, Staged};
use crate::locale::LocaleConfig;
use crate::localizer::merge_locales;
use crate::merger::{merge_localized_columns, merge_tag_records};
use crate::normalizer::{normalize, SourceDocument};
use crate::records::{CardRecord, CardTagRecord};
use crate::resolver::{default_hero_power_overrides, link_textures, resolve_identifiers, IdMaps};
use crate::rules::BuildRules;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub locales: LocaleConfig,
    /// Hero short id -> numeric hero power id, for heroes the card table misses
    pub hero_power_overrides: BTreeMap<String, u32>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            locales: LocaleConfig::default(),
            hero_power_overrides: default_hero_power_overrides(),
        }
    }
}

impl ReconcileConfig {
    /// Load from JSON; missing fields keep their defaults
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Everything one build is reconciled from
#[derive(Debug, Clone, Default)]
pub struct ReconcileInput {
    pub build: u32,
    pub documents: Vec<SourceDocument>,
    /// The CARD export
    pub card_table: Option<Table>,
    /// The CARD_TAG export
    pub card_tag_table: Option<Table>,
    /// Short id -> portrait texture path
    pub textures: BTreeMap<String, String>,
}

/// Build the canonical corpus of one build.
///
/// Relational overrides are folded in before identifiers are resolved, so a
/// hero power supplied only by CARD_TAG still gets its short id.
pub fn reconcile(input: ReconcileInput, config: &ReconcileConfig) -> Result<Staged<Corpus>> {
    let rules = BuildRules::for_build(input.build);
    let locales = &config.locales;
    let mut warnings = Vec::new();

    tracing::info!("reconciling build {}", rules.build);

    let raw = normalize(input.documents, &rules, locales)?;
    let mut corpus = merge_locales(raw, &rules, locales).absorb(&mut warnings);

    let card_records = match &input.card_table {
        Some(table) => CardRecord::from_table(table)?,
        None => Vec::new(),
    };
    let maps = IdMaps::from_records(&card_records);

    if let Some(table) = &input.card_tag_table {
        let records = CardTagRecord::from_table(table, &maps)?.absorb(&mut warnings);
        corpus = merge_tag_records(corpus, &records).absorb(&mut warnings);
    }
    corpus = merge_localized_columns(corpus, &card_records, locales);

    corpus =
        resolve_identifiers(corpus, &maps, &config.hero_power_overrides)?.absorb(&mut warnings);
    corpus = link_textures(corpus, &input.textures).absorb(&mut warnings);

    let enriched = enrich(corpus, &rules, locales).absorb(&mut warnings);

    tracing::info!(
        "build {}: {} entities, {} warnings",
        rules.build,
        enriched.corpus.len(),
        warnings.len()
    );
    Ok(Staged {
        value: enriched.corpus,
        warnings,
    })
}
