//! Typed rows of the CARD and CARD_TAG exports

use crate::error::{Diagnostics, Error, Result, Staged, Warning};
use crate::resolver::IdMaps;
use crate::table::{CellValue, Row, Table};
use crate::tags::{GameTag, TagCode};
use std::collections::BTreeMap;

/// Localized CARD columns and the tags they override
pub const LOCALIZED_COLUMNS: &[(GameTag, &str)] = &[
    (GameTag::CARDNAME, "NAME"),
    (GameTag::CARDTEXT_INHAND, "TEXT_IN_HAND"),
    (GameTag::FLAVORTEXT, "FLAVOR_TEXT"),
    (GameTag::HOW_TO_EARN, "HOW_TO_GET_CARD"),
    (GameTag::HOW_TO_EARN_GOLDEN, "HOW_TO_GET_GOLD_CARD"),
    (GameTag::TARGETING_ARROW_TEXT, "TARGET_ARROW_TEXT"),
    (GameTag::ARTISTNAME, "ARTIST_NAME"),
];

/// One row of the CARD table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    /// Numeric id
    pub id: u32,
    pub short_id: String,
    pub long_id: Option<String>,
    /// Numeric id of the hero power card
    pub hero_power_id: Option<u32>,
    /// Column text per tag; `None` for exports without localized columns
    pub localized: Option<BTreeMap<TagCode, String>>,
}

impl CardRecord {
    /// Read every row of a CARD export
    pub fn from_table(table: &Table) -> Result<Vec<CardRecord>> {
        let id_col = required_column(table, "ID")?;
        let short_col = required_column(table, "NOTE_MINI_GUID")?;
        let long_col = optional_column(table, "LONG_GUID");
        let hero_col = optional_column(table, "HERO_POWER_ID");

        // Localized strings only exist in newer exports
        let localized_cols: Option<Vec<(TagCode, usize)>> = table.has_column("NAME").then(|| {
            LOCALIZED_COLUMNS
                .iter()
                .filter_map(|(tag, name)| {
                    optional_column(table, name).map(|index| (TagCode::from(*tag), index))
                })
                .collect()
        });

        let mut records = Vec::with_capacity(table.row_count());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let id = cell(row, Some(id_col))
                .as_int()
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| invalid(table, row_idx, "ID"))?;

            let short_id = cell(row, Some(short_col)).to_string_value();
            if short_id.is_empty() {
                return Err(invalid(table, row_idx, "NOTE_MINI_GUID"));
            }

            let long_id = Some(cell(row, long_col).to_string_value()).filter(|s| !s.is_empty());
            let hero_power_id = cell(row, hero_col)
                .as_int()
                .filter(|i| *i > 0)
                .and_then(|i| u32::try_from(i).ok());

            let localized = localized_cols.as_ref().map(|cols| {
                cols.iter()
                    .map(|(tag, index)| (*tag, cell(row, Some(*index)).to_string_value()))
                    .collect()
            });

            records.push(CardRecord {
                id,
                short_id,
                long_id,
                hero_power_id,
                localized,
            });
        }

        Ok(records)
    }
}

/// One row of the CARD_TAG table: a raw tag override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTagRecord {
    /// Short id of the entity
    pub card_id: String,
    pub tag: TagCode,
    pub value: i64,
    /// Write as a referenced tag instead of an owned one
    pub is_reference: bool,
    /// Informational only
    pub is_power_keyword: bool,
}

impl CardTagRecord {
    /// Read every row of a CARD_TAG export.
    ///
    /// Rows are keyed by `NOTE_MINI_GUID` when the export has it, otherwise by
    /// the numeric `CARD_ID` looked up in `maps`.
    pub fn from_table(table: &Table, maps: &IdMaps) -> Result<Staged<Vec<CardTagRecord>>> {
        let mut diagnostics = Diagnostics::new();

        let short_col = optional_column(table, "NOTE_MINI_GUID");
        let dbf_col = match short_col {
            Some(_) => None,
            None => Some(required_column(table, "CARD_ID")?),
        };
        let tag_col = required_column(table, "TAG_ID")?;
        let value_col = required_column(table, "TAG_VALUE")?;
        let reference_col = optional_column(table, "IS_REFERENCE_TAG");
        let keyword_col = optional_column(table, "IS_POWER_KEYWORD_TAG");

        let mut records = Vec::with_capacity(table.row_count());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let card_id = match dbf_col {
                Some(index) => {
                    let dbf_id = cell(row, Some(index))
                        .as_int()
                        .ok_or_else(|| invalid(table, row_idx, "CARD_ID"))?;
                    let resolved = u32::try_from(dbf_id)
                        .ok()
                        .and_then(|id| maps.short_id(id));
                    match resolved {
                        Some(short_id) => short_id.to_string(),
                        None => {
                            diagnostics.warn(Warning::UnknownDbfId {
                                dbf_id,
                                table: table.name.clone(),
                            });
                            continue;
                        }
                    }
                }
                None => cell(row, short_col).to_string_value(),
            };

            let tag = cell(row, Some(tag_col))
                .as_int()
                .and_then(|i| u32::try_from(i).ok())
                .map(TagCode)
                .ok_or_else(|| invalid(table, row_idx, "TAG_ID"))?;
            let value = cell(row, Some(value_col))
                .as_int()
                .ok_or_else(|| invalid(table, row_idx, "TAG_VALUE"))?;
            let is_reference = cell(row, reference_col)
                .as_bool()
                .ok_or_else(|| invalid(table, row_idx, "IS_REFERENCE_TAG"))?;
            let is_power_keyword = cell(row, keyword_col)
                .as_bool()
                .ok_or_else(|| invalid(table, row_idx, "IS_POWER_KEYWORD_TAG"))?;

            records.push(CardTagRecord {
                card_id,
                tag,
                value,
                is_reference,
                is_power_keyword,
            });
        }

        Ok(diagnostics.finish(records))
    }
}

fn required_column(table: &Table, name: &str) -> Result<usize> {
    optional_column(table, name).ok_or_else(|| Error::MissingColumn {
        table: table.name.clone(),
        column: name.to_string(),
    })
}

fn optional_column(table: &Table, name: &str) -> Option<usize> {
    table.find_column(name).map(|c| c.index)
}

static EMPTY: CellValue = CellValue::Empty;

fn cell(row: &Row, index: Option<usize>) -> &CellValue {
    index.and_then(|i| row.get(i)).unwrap_or(&EMPTY)
}

fn invalid(table: &Table, row_idx: usize, column: &str) -> Error {
    Error::InvalidCell {
        table: table.name.clone(),
        row: row_idx + 1,
        column: column.to_string(),
    }
}
