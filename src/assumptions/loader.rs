//! CSV-based table loader
//!
//! Every `<name>.csv` file in the assumptions directory becomes table `<name>`. The
//! first column of each file holds the row labels.

use super::tables::{Table, TableSet};
use crate::error::{EngineError, Result};
use std::fs;
use std::path::Path;

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

/// Parse one table from CSV text
pub fn read_table<R: std::io::Read>(reader: R, origin: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().map_err(|e| EngineError::csv(origin, e))?.clone();

    let mut table = Table::new(headers.iter().skip(1).map(|h| h.trim().to_string()).collect());
    for result in reader.records() {
        let record = result.map_err(|e| EngineError::csv(origin, e))?;
        let mut fields = record.iter().map(|f| f.trim().to_string());
        let Some(label) = fields.next() else { continue };
        table.push_row(label, fields.collect());
    }
    Ok(table)
}

/// Load a single table file
pub fn load_table(path: &Path) -> Result<Table> {
    let file = fs::File::open(path).map_err(|e| EngineError::io(path, e))?;
    read_table(file, path)
}

/// Load every CSV file in `dir`
pub fn load_table_dir(dir: &Path) -> Result<TableSet> {
    let entries = fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;
    let mut set = TableSet::new();

    for entry in entries {
        let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let table = load_table(&path)?;
        log::debug!("loaded table {name} ({} rows)", table.len());
        set.insert(name, table);
    }

    log::info!("loaded {} assumption tables from {}", set.names().len(), dir.display());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::TableProvider;

    #[test]
    fn test_read_table() {
        let csv = "Year,Locked,Previous,Current\n0,0.03,0.03,0.04\n1, 0.031 ,0.03,0.041\n";
        let table = read_table(csv.as_bytes(), Path::new("discount_rates.csv")).unwrap();
        assert_eq!(table.columns(), &["Locked", "Previous", "Current"]);
        assert_eq!(table.len(), 2);

        let mut set = TableSet::new();
        set.insert("discount_rates", table);
        assert_eq!(set.lookup("discount_rates", "1", "Locked").unwrap(), 0.031);
    }

    #[test]
    fn test_missing_directory_reports_path() {
        let err = load_table_dir(Path::new("no/such/assumptions")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
        assert!(err.to_string().contains("no/such/assumptions"));
    }
}
