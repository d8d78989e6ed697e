use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::debug;

use crate::models::records::{Record, RecordSet};

/// Best-effort delimiter detection on the header line. Newer stitched
/// exports are comma-delimited, older ones semicolon-delimited.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let commas = header_line.matches(',').count();
    let semicolons = header_line.matches(';').count();
    if commas >= semicolons && commas > 0 {
        b','
    } else if semicolons > 0 {
        b';'
    } else {
        b','
    }
}

/// Read a delimited file into a record set. Tolerates a UTF-8 BOM and short
/// rows; blank cells are simply absent from the record.
pub fn read_records(path: &Path) -> Result<RecordSet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let delimiter = sniff_delimiter(raw.lines().next().unwrap_or(""));
    debug!(
        "Reading {} with delimiter '{}'",
        path.display(),
        delimiter as char
    );

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut set = RecordSet::new(columns);
    for row in reader.records() {
        let row = row.with_context(|| format!("Failed to parse a row of {}", path.display()))?;
        let mut record = Record::new();
        for (index, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            if let Some(column) = set.columns.get(index) {
                record.set(column.clone(), value);
            }
        }
        set.records.push(record);
    }
    Ok(set)
}

/// Write a record set comma-delimited, creating parent directories as
/// needed. Output delimiter is always a comma regardless of the input.
pub fn write_records(path: &Path, records: &RecordSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .from_path(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;

    writer
        .write_record(&records.columns)
        .context("Failed to write header row")?;
    for record in &records.records {
        let row: Vec<&str> = records.columns.iter().map(|c| record.get(c)).collect();
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write a row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c"), b',');
        assert_eq!(sniff_delimiter("a;b;c"), b';');
        assert_eq!(sniff_delimiter("a,b;c;d"), b';');
        assert_eq!(sniff_delimiter("single_column"), b',');
    }

    #[test]
    fn test_read_semicolon_file_with_bom() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("input.csv");
        fs::write(
            &path,
            "\u{feff}CompanyName;Company Phone\nAcme GmbH;+49 30 111111\nBeta AG;\n",
        )
        .unwrap();
        let set = read_records(&path).unwrap();
        assert_eq!(
            set.columns,
            vec!["CompanyName".to_string(), "Company Phone".to_string()]
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].get("Company Phone"), "+49 30 111111");
        assert!(set.records[1].is_blank("Company Phone"));
    }

    #[test]
    fn test_round_trip_preserves_cells_and_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");

        let mut set = RecordSet::new(vec!["A".to_string(), "B".to_string()]);
        set.records.push(Record::from_pairs([("A", "1"), ("B", "x, y")]));
        set.records.push(Record::from_pairs([("B", "z")]));
        write_records(&path, &set).unwrap();

        let reread = read_records(&path).unwrap();
        assert_eq!(reread.columns, set.columns);
        assert_eq!(reread.records[0].get("B"), "x, y");
        assert_eq!(reread.records[1].get("A"), "");
        assert_eq!(reread.records[1].get("B"), "z");
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/run/out.csv");
        let set = RecordSet::new(vec!["A".to_string()]);
        write_records(&path, &set).unwrap();
        assert!(path.exists());
    }
}
