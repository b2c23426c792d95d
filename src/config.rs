// ==============================================================================
// config.rs - Configuration Loading
// ==============================================================================
// Description: Data file locations, remote hosting settings and the
//              chromosome -> location mappings
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Example (agv-catalog.json, every field optional):
//   {
//     "agv_catalog": "files/AGVs_hg38.txt.gz",
//     "sample_annotation": "files/AADR_sample_annotation_basic.txt.gz",
//     "ld_locations": "files/AGVs_Box_URLs.json",
//     "genotype_locations": "files/VCFs_Box_URLs.json",
//     "base_url": "https://ucsf.box.com/shared/static",
//     "rsid_chromosome_url": "https://example.org/rsid_chr.tsv.gz"
//   }
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::models::Chromosome;

pub const DEFAULT_BASE_URL: &str = "https://ucsf.box.com/shared/static";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// AGV catalog (tab-delimited, no header)
    pub agv_catalog: PathBuf,

    /// AADR sample annotation table
    pub sample_annotation: PathBuf,

    /// JSON mapping "chr<N>" -> LD table location token
    pub ld_locations: PathBuf,

    /// JSON mapping "chr<N>" -> genotype matrix location token
    pub genotype_locations: PathBuf,

    /// Prefix for `<base_url>/<token>.gz` downloads
    pub base_url: String,

    /// Gzipped `rsID<TAB>chr` table used when an rsID is not an AGV
    pub rsid_chromosome_url: Option<String>,

    /// Read `<dir>/<token>.gz` from disk instead of downloading
    pub local_data_dir: Option<PathBuf>,

    /// Unparseable AGV catalog rows tolerated before failing
    pub max_catalog_errors: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agv_catalog: PathBuf::from("files/AGVs_hg38.txt.gz"),
            sample_annotation: PathBuf::from("files/AADR_sample_annotation_basic.txt.gz"),
            ld_locations: PathBuf::from("files/AGVs_Box_URLs.json"),
            genotype_locations: PathBuf::from("files/VCFs_Box_URLs.json"),
            base_url: DEFAULT_BASE_URL.to_string(),
            rsid_chromosome_url: None,
            local_data_dir: None,
            max_catalog_errors: 1000,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

/// Chromosome -> opaque location token (`{"chr1": "<token>", ...}`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LocationMap(HashMap<String, String>);

impl LocationMap {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let map: LocationMap = serde_json::from_str(&content)?;
        if map.is_empty() {
            warn!("No chromosome locations in {:?}; every table lookup will fail", path);
        }
        info!("Loaded {} chromosome locations from {:?}", map.len(), path);
        Ok(map)
    }

    pub fn get(&self, chromosome: Chromosome) -> Option<&str> {
        self.0.get(&chromosome.location_key()).map(String::as_str)
    }

    pub fn insert(&mut self, chromosome: Chromosome, token: impl Into<String>) {
        self.0.insert(chromosome.location_key(), token.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
