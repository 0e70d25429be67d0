use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use tracing::{debug, info, warn};

use crate::record::CompanyRecord;

pub const CSV_NAME: &str = "output.csv";
pub const RAW_NAME: &str = "raw_export.txt";
const SNAPSHOT_DIR: &str = "snapshots";

fn write_rows(path: &Path, schema: &[String], rows: &[Vec<String>]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut wtr = Writer::from_writer(file);
    wtr.write_record(schema)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `<dir>/output.csv` plus a timestamped copy under `<dir>/snapshots/`.
/// A failed snapshot is logged and ignored.
pub fn write_csv(dir: &Path, schema: &[String], rows: &[Vec<String>]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(CSV_NAME);
    debug!("Exporting {} rows to CSV: {}", rows.len(), path.display());
    write_rows(&path, schema, rows)?;

    let snapshot = dir
        .join(SNAPSHOT_DIR)
        .join(format!("output_{}.csv", Local::now().format("%Y%m%d_%H%M%S")));
    let snap = fs::create_dir_all(dir.join(SNAPSHOT_DIR))
        .map_err(anyhow::Error::from)
        .and_then(|_| write_rows(&snapshot, schema, rows));
    if let Err(e) = snap {
        warn!("snapshot {} not written: {:#}", snapshot.display(), e);
    }

    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Human-readable evidence block for one company.
pub fn raw_block(record: &CompanyRecord, units: &[String], row: usize) -> String {
    let mut lines = vec![format!("Row {}:  {}", row, record.company_name)];
    let locality = match (record.city.as_str(), record.state.as_str(), record.zip.as_str()) {
        ("", "", "") => String::new(),
        (city, state, zip) => format!("{}, {} {}", city, state, zip).trim().to_string(),
    };
    for line in [&record.homepage_url, &record.domain, &record.street, &locality] {
        if !line.is_empty() {
            lines.push(line.clone());
        }
    }
    if !record.phone.is_empty() {
        lines.push(format!("Phone:  {}", record.phone));
    }
    lines.push(String::new());
    lines.extend(units.iter().cloned());

    let mut block = lines.join("\n");
    block.push_str("\n\n");
    block
}

/// Append-only raw text export, truncated when opened.
pub struct RawExport {
    file: File,
    path: PathBuf,
}

impl RawExport {
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(RAW_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(Self { file, path })
    }

    pub fn append(&mut self, record: &CompanyRecord, units: &[String], row: usize) -> Result<()> {
        self.file
            .write_all(raw_block(record, units, row).as_bytes())
            .with_context(|| format!("writing {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
