//! CSV parser for relational export tables

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};

/// Parse a CSV export into a Table
pub fn parse_csv_str(content: &str, table_name: &str) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        table: table_name.to_string(),
        source: e,
    })?;

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.trim().to_string(), i))
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.name.is_empty()) {
        return Err(Error::TableParse {
            table: table_name.to_string(),
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            table: table_name.to_string(),
            source: e,
        })?;

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();

        while cells.len() < columns.len() {
            cells.push(CellValue::Empty);
        }
        if cells.len() > columns.len() {
            tracing::warn!(
                "row {} in {} has more cells than columns, truncating",
                row_idx + 1,
                table_name
            );
            cells.truncate(columns.len());
        }

        rows.push(Row::new(cells));
    }

    Ok(Table {
        name: table_name.to_string(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card_table() {
        let csv = "ID,NOTE_MINI_GUID,HERO_POWER_ID\n1178,EX1_tk33,\n7,HERO_01,725\n";
        let table = parse_csv_str(csv, "CARD").unwrap();

        assert_eq!(table.name, "CARD");
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns[1].name, "NOTE_MINI_GUID");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[0], CellValue::Integer(1178));
        assert_eq!(table.rows[0].cells[2], CellValue::Empty);
        assert_eq!(table.rows[1].cells[2], CellValue::Integer(725));
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let csv = "ID,NAME,FLAVOR_TEXT\n1,Fireball\n";
        let table = parse_csv_str(csv, "CARD").unwrap();
        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(table.rows[0].cells[2], CellValue::Empty);
    }

    #[test]
    fn test_parse_truncates_long_rows() {
        let csv = "ID,NAME\n1,Fireball,extra\n";
        let table = parse_csv_str(csv, "CARD").unwrap();
        assert_eq!(table.rows[0].cells.len(), 2);
    }

    #[test]
    fn test_parse_quoted_text_with_commas() {
        let csv = "ID,TEXT_IN_HAND\n1,\"Deal 6 damage, then draw.\"\n";
        let table = parse_csv_str(csv, "CARD").unwrap();
        assert_eq!(
            table.rows[0].cells[1],
            CellValue::String("Deal 6 damage, then draw.".to_string())
        );
    }

    #[test]
    fn test_parse_trims_header_names() {
        let csv = "NOTE_MINI_GUID , TAG_ID\nCS2_029,48\n";
        let table = parse_csv_str(csv, "CARD_TAG").unwrap();
        assert!(table.has_column("NOTE_MINI_GUID"));
        assert!(table.has_column("TAG_ID"));
    }

    #[test]
    fn test_parse_empty_header_fails() {
        assert!(parse_csv_str("", "CARD").is_err());
    }
}
