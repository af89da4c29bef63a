//! CSV read/write for stage artifacts. Missing cells are empty fields.

use crate::error::{Error, Result};
use crate::features::{FeatureTable, FeatureVector};
use crate::normalize::{Cell, NormalizedTable, Row};
use std::fs::File;
use std::path::Path;

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
    }
    File::create(path).map_err(|e| Error::from_io(path, e))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::from_io(path, e))
}

/// Write `table`, replacing any previous artifact. A table without columns writes an empty file.
pub fn write_table(path: &Path, table: &NormalizedTable) -> Result<()> {
    let file = create(path)?;
    if table.columns().is_empty() {
        return Ok(());
    }
    let mut w = csv::Writer::from_writer(file);
    w.write_record(table.columns())?;
    for i in 0..table.len() {
        w.write_record(table.columns().iter().map(|c| table.cell(i, c).to_string()))?;
    }
    w.flush().map_err(|e| Error::from_io(path, e))?;
    Ok(())
}

/// Read a table back as text cells; coercion is the caller's job.
pub fn read_table(path: &Path) -> Result<NormalizedTable> {
    let mut r = csv::Reader::from_reader(open(path)?);
    let headers = r.headers()?.clone();
    let mut table = NormalizedTable::with_columns(headers.iter());
    for record in r.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), Cell::Text(v.to_string())))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

pub fn write_feature_table(path: &Path, table: &FeatureTable) -> Result<()> {
    let mut w = csv::Writer::from_writer(create(path)?);
    w.write_record(table.columns())?;
    for row in table.rows() {
        let mut fields: Vec<String> = Vec::with_capacity(9);
        fields.push(row.ip.clone());
        fields.extend(row.values().iter().map(|v| v.to_string()));
        if table.has_label() {
            fields.push(row.label.map(|l| l.to_string()).unwrap_or_default());
        }
        w.write_record(&fields)?;
    }
    w.flush().map_err(|e| Error::from_io(path, e))?;
    Ok(())
}

/// The label column counts as present only when the header names it.
pub fn read_feature_table(path: &Path) -> Result<FeatureTable> {
    let mut r = csv::Reader::from_reader(open(path)?);
    let has_label = r.headers()?.iter().any(|h| h == "label");
    let rows = r
        .deserialize::<FeatureVector>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(FeatureTable::from_rows(rows, has_label))
}
