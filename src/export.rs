// src/export.rs

use crate::config::ScraperConfig;
use crate::dataset::{Dataset, TableSet};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Write `dataset` as CSV: one header row, missing cells left empty.
pub fn write_csv<W: std::io::Write>(dataset: &Dataset, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(dataset.columns())?;
    for row in dataset.rows() {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv(dataset: &Dataset) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    String::from_utf8(buf).context("CSV output was not UTF-8")
}

/// `"ORDINARY SHARES"` → `jse_ordinary_shares.csv`
pub fn file_name(display_name: &str) -> String {
    format!("jse_{}.csv", display_name.to_lowercase().replace(' ', "_"))
}

/// Write every table of `tables` that `config` names into `dir`.
pub fn write_table_set(
    dir: impl AsRef<Path>,
    tables: &TableSet,
    config: &ScraperConfig,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;

    let mut written = Vec::new();
    for spec in &config.tables {
        let Some(ds) = tables.get(&spec.key) else {
            continue;
        };
        let path = dir.join(file_name(&spec.display_name));
        let file = fs::File::create(&path).with_context(|| format!("creating {:?}", path))?;
        write_csv(ds, file).with_context(|| format!("writing {:?}", path))?;
        info!(path = %path.display(), rows = ds.len(), "exported table");
        written.push(path);
    }
    Ok(written)
}
