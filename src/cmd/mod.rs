//! Command layer: dataset acquisition from disk plus the user-facing
//! subcommands.

pub mod estimate;
pub mod lookup;
pub mod schema;
pub mod search;
pub mod validate;

use crate::records;
use crate::store::{DatasetBundle, ReferenceStore};
use anyhow::Context;
use clap::Args;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Locations of the four cleaned datasets. Each file may be CSV (with a
/// header row) or a JSON array; the extension decides.
#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// Directory containing the cleaned county datasets
    #[arg(short, long, default_value = "data/cleaned")]
    pub data_dir: PathBuf,

    /// Addresses file (defaults to <DATA_DIR>/addresses.{csv,json})
    #[arg(long)]
    pub addresses: Option<PathBuf>,

    /// Market file (defaults to <DATA_DIR>/market.{csv,json})
    #[arg(long)]
    pub market: Option<PathBuf>,

    /// Seniors file (defaults to <DATA_DIR>/seniors.{csv,json})
    #[arg(long)]
    pub seniors: Option<PathBuf>,

    /// Adjustments file (defaults to <DATA_DIR>/adjustments.{csv,json})
    #[arg(long)]
    pub adjustments: Option<PathBuf>,
}

impl DatasetArgs {
    /// Read all four datasets, then index them in one atomic load.
    pub fn load_store(&self) -> anyhow::Result<ReferenceStore> {
        let bundle = self.read_bundle()?;
        let mut store = ReferenceStore::new();
        store.load(bundle)?;
        Ok(store)
    }

    /// Read all four datasets into memory without indexing them. Any read or
    /// parse failure aborts the whole acquisition.
    pub fn read_bundle(&self) -> anyhow::Result<DatasetBundle> {
        Ok(DatasetBundle {
            addresses: read_dataset(&self.resolve_path(&self.addresses, "addresses")?)?,
            market: read_dataset(&self.resolve_path(&self.market, "market")?)?,
            seniors: read_dataset(&self.resolve_path(&self.seniors, "seniors")?)?,
            adjustments: read_dataset(&self.resolve_path(&self.adjustments, "adjustments")?)?,
        })
    }

    fn resolve_path(&self, overridden: &Option<PathBuf>, name: &str) -> anyhow::Result<PathBuf> {
        if let Some(path) = overridden {
            return Ok(path.clone());
        }
        for ext in ["csv", "json"] {
            let candidate = self.data_dir.join(format!("{name}.{ext}"));
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        anyhow::bail!(
            "no {name}.csv or {name}.json under {} (use --{name} to point at the file)",
            self.data_dir.display()
        )
    }
}

/// Read one dataset file, logging its record count and content fingerprint.
pub fn read_dataset<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let fingerprint = hex::encode(Sha256::digest(&bytes));
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let parsed = if is_json {
        records::read_json(bytes.as_slice())
    } else {
        records::read_csv(bytes.as_slice())
    };
    let records = parsed.with_context(|| format!("failed to parse {}", path.display()))?;
    log::debug!(
        "{}: {} records, sha256 {}",
        path.display(),
        records.len(),
        &fingerprint[..12]
    );
    Ok(records)
}
