//! Locating and loading raw inputs from disk

use cardxml_core::{parse_csv_str, parse_document, Error, Result, SourceDocument, Table};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Find every XML document under `root`, in path order
pub fn find_documents(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
        .collect();
    paths.sort();
    paths
}

/// Build number from the first all-digit path component
///
/// Examples:
/// - "data/12574/enUS.xml" -> Some(12574)
/// - "data/latest/enUS.xml" -> None
pub fn detect_build(path: &Path) -> Option<u32> {
    path.components().find_map(|component| match component {
        Component::Normal(part) => part
            .to_str()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse().ok()),
        _ => None,
    })
}

/// The explicit build number, else the one named by the first input path
pub fn build_number(explicit: Option<u32>, paths: &[PathBuf]) -> Result<u32> {
    explicit
        .or_else(|| paths.first().and_then(|p| detect_build(p)))
        .ok_or(Error::BuildNotDetected)
}

/// Name a document is known by: its file stem, usually a locale code
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse raw documents
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let name = document_name(path);
        tracing::debug!("reading {} as {:?}", path.display(), name);
        let root = parse_document(&read_text(path)?, &name)?;
        documents.push(SourceDocument::new(name, root));
    }
    Ok(documents)
}

/// Read a relational CSV export
pub fn load_table(path: &Path, table_name: &str) -> Result<Table> {
    let table = parse_csv_str(&read_text(path)?, table_name)?;
    tracing::info!(
        "loaded {} ({} columns, {} rows)",
        table_name,
        table.column_count(),
        table.row_count()
    );
    Ok(table)
}

/// Read a JSON object of short id -> texture path
pub fn load_textures(path: &Path) -> Result<BTreeMap<String, String>> {
    Ok(serde_json::from_str(&read_text(path)?)?)
}
