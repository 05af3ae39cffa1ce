//! Error and warning types for cardxml-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed XML input
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Document does not have a single root element
    #[error("malformed document '{name}': {message}")]
    MalformedDocument { name: String, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{table}': {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    /// Table has a header but no columns
    #[error("failed to parse table '{table}': {message}")]
    TableParse { table: String, message: String },

    /// A column required by a typed record is missing
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A required cell is empty or has the wrong type
    #[error("table '{table}' row {row}: invalid value in column '{column}'")]
    InvalidCell {
        table: String,
        row: usize,
        column: String,
    },

    /// Unrecognized element inside a raw entity or document
    #[error("unknown element <{element}> inside <{parent}> ({context})")]
    UnknownElement {
        element: String,
        parent: String,
        context: String,
    },

    /// A required attribute is absent
    #[error("missing attribute '{attribute}' on <{element}> ({context})")]
    MissingAttribute {
        attribute: String,
        element: String,
        context: String,
    },

    /// An attribute outside the known set was found
    #[error("unexpected attribute '{attribute}' on <{element}> ({context})")]
    UnexpectedAttribute {
        attribute: String,
        element: String,
        context: String,
    },

    /// An attribute or text value could not be interpreted
    #[error("invalid value '{value}' for {what} ({context})")]
    InvalidValue {
        value: String,
        what: String,
        context: String,
    },

    /// No `--build` given and none of the input paths names one
    #[error("could not detect the build number from the input paths, use --build")]
    BuildNotDetected,

    /// Entity-rooted and CardDefs-rooted documents were supplied together
    #[error("cannot mix per-entity and CardDefs documents in one run")]
    MixedDocuments,

    /// A hero power override is also resolved from source data
    #[error(
        "hero power override for '{card_id}' conflicts with source data \
         (override {override_id}, found {found_id})"
    )]
    OverrideConflict {
        card_id: String,
        override_id: u32,
        found_id: i64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A non-fatal data-integrity problem.
///
/// Reference tables lag behind content tables and early descriptions do not
/// always print amounts, so these are expected on real data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// An entity appears twice in the same document; the first one is kept
    #[error("entity {card_id:?} appears more than once in {document:?}")]
    DuplicateEntity { card_id: String, document: String },

    /// An entity was not in the primary locale document
    #[error("entity {card_id:?} not in the primary locale document, first seen in {locale:?}")]
    MissingPrimaryLocale { card_id: String, locale: String },

    /// A string bag lost all its text when collapsed to the primary locale
    #[error("entity {card_id:?} has no primary locale text for {tag}")]
    NoPrimaryText { card_id: String, tag: String },

    /// A table row names an entity that is not in the corpus
    #[error("entity {card_id:?} not found in card defs but present in {table}")]
    UnknownCard { card_id: String, table: String },

    /// A numeric card id has no row in the card table
    #[error("card id {dbf_id} from {table} not found in the card table")]
    UnknownDbfId { dbf_id: i64, table: String },

    /// A long id could not be mapped to a short id in the corpus
    #[error("entourage {long_id:?} of {card_id:?} does not resolve to a known card")]
    UnresolvedLongId { card_id: String, long_id: String },

    /// A hero power numeric id could not be mapped to a short id
    #[error("hero power {dbf_id} for {card_id:?} not found")]
    UnresolvedHeroPower { card_id: String, dbf_id: i64 },

    /// A texture entry names an entity that is not in the corpus
    #[error("texture given for unknown entity {card_id:?}")]
    UnknownTexture { card_id: String },

    /// Overload marker set but the description has no amount
    #[error("could not guess overload for {card_id:?}: {description:?}")]
    NoOverloadAmount { card_id: String, description: String },

    /// Spell power marker set but the description has no amount
    #[error("could not guess spell power for {card_id:?}: {description:?}")]
    NoSpellPowerAmount { card_id: String, description: String },
}

/// The outcome of a stage that completed: its value plus any warnings.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    /// Stage output
    pub value: T,
    /// Data-integrity warnings raised along the way, in order
    pub warnings: Vec<Warning>,
}

impl<T> Staged<T> {
    /// Wrap a value with no warnings
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Move the warnings into `sink` and return the value
    pub fn absorb(self, sink: &mut Vec<Warning>) -> T {
        sink.extend(self.warnings);
        self.value
    }
}

/// Collects warnings for a stage and logs each one as it arrives.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub(crate) fn finish<T>(self, value: T) -> Staged<T> {
        Staged {
            value,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_absorb() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(Warning::UnknownTexture {
            card_id: "CS2_001".to_string(),
        });
        let staged = diagnostics.finish(7);

        let mut sink = Vec::new();
        assert_eq!(staged.absorb(&mut sink), 7);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::UnresolvedHeroPower {
            card_id: "HERO_01".to_string(),
            dbf_id: 725,
        };
        assert_eq!(warning.to_string(), "hero power 725 for \"HERO_01\" not found");

        let warning = Warning::UnresolvedLongId {
            card_id: "NEW1_016".to_string(),
            long_id: "abc".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "entourage \"abc\" of \"NEW1_016\" does not resolve to a known card"
        );
    }
}
