// ==============================================================================
// fetcher.rs - Remote Table Retrieval
// ==============================================================================
// Description: Resolves a chromosome to its dataset location, downloads the
//              gzip payload and exposes it as a line stream
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// LD tables and genotype matrices are hosted one file per chromosome at
// <base_url>/<token>.gz, where <token> comes from a chromosome -> location
// mapping. Payloads are buffered in memory before decompression; callers only
// see the TableSource trait, so a bounded streaming source can replace it.
// ==============================================================================

use std::fmt;
use std::io::{BufRead, Cursor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::LocationMap;
use crate::error::{AgvError, Result};
use crate::models::Chromosome;
use crate::parsers::{decompressing_reader, open_table};

/// Kind of per-chromosome dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    LdTable,
    GenotypeMatrix,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::LdTable => f.write_str("LD table"),
            Dataset::GenotypeMatrix => f.write_str("genotype matrix"),
        }
    }
}

/// Byte transport for remote payloads
pub trait Transport: Send + Sync {
    /// Fetch the whole payload at `url`
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP transport (no retries; client default timeout)
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| AgvError::Fetch {
                url: String::new(),
                status: None,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |status: Option<u16>, message: String| AgvError::Fetch {
            url: url.to_string(),
            status,
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(Some(status.as_u16()), format!("HTTP {}", status)));
        }

        let content = response
            .bytes()
            .map_err(|e| fetch_error(Some(status.as_u16()), format!("Failed to read response: {}", e)))?;

        Ok(content.to_vec())
    }
}

/// Per-chromosome table stream
pub trait TableSource: Send + Sync {
    fn dataset(&self) -> Dataset;

    /// Open the decompressed table for `chromosome`
    fn open(&self, chromosome: Chromosome) -> Result<Box<dyn BufRead + Send>>;
}

fn mapping_error(dataset: Dataset, chromosome: Chromosome) -> AgvError {
    AgvError::Mapping {
        dataset: dataset.to_string(),
        chromosome: chromosome.to_string(),
    }
}

/// Fetches `<base_url>/<token>.gz` through a Transport
pub struct RemoteTableFetcher {
    dataset: Dataset,
    base_url: String,
    locations: LocationMap,
    transport: Arc<dyn Transport>,
}

impl RemoteTableFetcher {
    pub fn new(
        dataset: Dataset,
        base_url: impl Into<String>,
        locations: LocationMap,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            dataset,
            base_url: base_url.into(),
            locations,
            transport,
        }
    }

    /// Download URL for `chromosome`, or a mapping error
    pub fn url_for(&self, chromosome: Chromosome) -> Result<String> {
        let token = self
            .locations
            .get(chromosome)
            .ok_or_else(|| mapping_error(self.dataset, chromosome))?;

        Ok(format!("{}/{}.gz", self.base_url.trim_end_matches('/'), token))
    }
}

impl TableSource for RemoteTableFetcher {
    fn dataset(&self) -> Dataset {
        self.dataset
    }

    fn open(&self, chromosome: Chromosome) -> Result<Box<dyn BufRead + Send>> {
        let url = self.url_for(chromosome)?;
        info!("Fetching {} for chromosome {}", self.dataset, chromosome);
        debug!("GET {}", url);

        let payload = self.transport.get(&url)?;
        info!("Downloaded {} bytes of {} data", payload.len(), self.dataset);

        Ok(decompressing_reader(Cursor::new(payload))?)
    }
}

/// Reads `<dir>/<token>.gz` from local disk (mirrored datasets, tests)
pub struct LocalTableSource {
    dataset: Dataset,
    dir: PathBuf,
    locations: LocationMap,
}

impl LocalTableSource {
    pub fn new(dataset: Dataset, dir: impl Into<PathBuf>, locations: LocationMap) -> Self {
        Self {
            dataset,
            dir: dir.into(),
            locations,
        }
    }
}

impl TableSource for LocalTableSource {
    fn dataset(&self) -> Dataset {
        self.dataset
    }

    fn open(&self, chromosome: Chromosome) -> Result<Box<dyn BufRead + Send>> {
        let token = self
            .locations
            .get(chromosome)
            .ok_or_else(|| mapping_error(self.dataset, chromosome))?;

        let path = self.dir.join(format!("{}.gz", token));
        info!("Opening {} for chromosome {}: {:?}", self.dataset, chromosome, path);

        Ok(open_table(path)?)
    }
}
