//! cardxml-core: reconcile raw card definitions into a canonical corpus
//!
//! This library provides functionality to:
//! - Normalize raw `CardDefs` and `Entity` documents of either known shape
//! - Merge per-locale text into locale bags
//! - Resolve numeric, long and short card ids against the CARD export
//! - Fold CARD and CARD_TAG overrides into the entities
//! - Derive tags from description text
//! - Write and read canonical `CardDefs` documents and diff two of them

pub mod differ;
pub mod enricher;
pub mod entity;
pub mod error;
pub mod export;
pub mod locale;
pub mod localizer;
pub mod merger;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod records;
pub mod resolver;
pub mod rules;
pub mod table;
pub mod tags;
pub mod xml;

pub use differ::{diff, diff_entity, Change, ChangeReport, EntityDiff, TextValue};
pub use enricher::{enrich, Enriched};
pub use entity::{Corpus, Entity, PlayRequirement, Power, TriggeredPowerHistory};
pub use error::{Error, Result, Staged, Warning};
pub use export::{corpus_to_xml, read_corpus, write_corpus};
pub use locale::{LocaleBag, LocaleConfig};
pub use localizer::merge_locales;
pub use merger::{merge_localized_columns, merge_tag_records};
pub use normalizer::{normalize, SourceDocument};
pub use parser::parse_csv_str;
pub use pipeline::{reconcile, ReconcileConfig, ReconcileInput};
pub use records::{CardRecord, CardTagRecord};
pub use resolver::{link_textures, resolve_identifiers, IdMaps};
pub use rules::BuildRules;
pub use table::{CellValue, Column, Row, Table};
pub use tags::{GameTag, TagCode, TagType, TagValue};
pub use xml::{parse_document, write_document, XmlNode};
