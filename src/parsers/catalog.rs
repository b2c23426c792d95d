// ==============================================================================
// parsers/catalog.rs - AGV Catalog Parser
// ==============================================================================
// Description: Parser for the ancient genotyped variant catalog (hg38)
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited, no header, optionally gzip-compressed
// Example:
//   11    63290453    rs1234567    C    T
//   X     1500321     rs7654321    G    A
// ==============================================================================

use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{AgvError, Result};
use crate::models::{AgvRecord, Chromosome};

/// Parser for the AGV catalog with bad-row tolerance
pub struct CatalogParser {
    /// Maximum number of unparseable rows before failing
    pub max_errors: usize,

    /// Count of skipped rows (for reporting)
    pub skipped_count: usize,
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self {
            max_errors: 1000,
            skipped_count: 0,
        }
    }
}

impl CatalogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum allowed bad rows
    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = max;
        self
    }

    /// Parse the catalog from a local file (.txt or .txt.gz)
    pub fn parse_path(&mut self, path: impl AsRef<Path>) -> Result<Vec<AgvRecord>> {
        let path = path.as_ref();
        info!("Loading AGV catalog: {:?}", path);
        let reader = super::open_table(path)?;
        self.parse(reader)
    }

    /// Parse catalog rows from any reader
    ///
    /// Rows with an invalid chromosome or position are skipped with a warning;
    /// more than `max_errors` such rows fails the whole load.
    pub fn parse<R: Read>(&mut self, reader: R) -> Result<Vec<AgvRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut records = Vec::new();
        self.skipped_count = 0;

        for result in reader.records() {
            let row = result?;
            let line = row.position().map(|p| p.line() as usize).unwrap_or(0);

            match Self::parse_row(&row, line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping AGV catalog row: {}", e);
                    self.skipped_count += 1;

                    if self.skipped_count > self.max_errors {
                        return Err(AgvError::parse(
                            line,
                            format!("Too many errors ({} > {})", self.skipped_count, self.max_errors),
                        ));
                    }
                }
            }
        }

        info!(
            "Loaded {} AGVs ({} rows skipped)",
            records.len(),
            self.skipped_count
        );

        Ok(records)
    }

    fn parse_row(row: &StringRecord, line: usize) -> Result<AgvRecord> {
        if row.len() < 5 {
            return Err(AgvError::parse(
                line,
                format!("Expected 5 tab-delimited fields, found {}", row.len()),
            ));
        }

        let chromosome: Chromosome = row[0]
            .parse()
            .map_err(|e: AgvError| AgvError::parse(line, e.to_string()))?;

        let position = row[1]
            .trim()
            .parse::<u64>()
            .map_err(|_| AgvError::parse(line, format!("Invalid position: {}", &row[1])))?;

        Ok(AgvRecord {
            chromosome,
            position,
            rsid: row[2].trim().to_string(),
            ref_allele: row[3].trim().to_string(),
            alt_allele: row[4].trim().to_string(),
        })
    }
}
