// ==============================================================================
// parsers/genotype_matrix.rs - Streaming Genotype Matrix Extractor
// ==============================================================================
// Description: Scans a per-chromosome AADR VCF for one rsID and returns every
//              sample's genotype call at that variant
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
// Format: VCF-like text. Only three things matter here:
//   - the "#CHROM" header line, whose columns 10+ are sample identifiers
//   - column 3 (ID) of data lines, compared against the target rsID
//   - columns 10+ of the matching data line, kept as raw genotype tokens
// Matrices hold thousands of samples per line, so lines are split lazily and
// the scan stops at the first match.
// ==============================================================================

use std::io::BufRead;
use tracing::{debug, info};

use crate::error::{AgvError, Result};
use crate::models::GenotypeRow;

/// Header line prefix carrying sample identifiers
const HEADER_PREFIX: &str = "#CHROM";

/// 0-based column of the variant identifier
const ID_COLUMN: usize = 2;

/// 0-based column where sample columns begin (after FORMAT)
const FIRST_SAMPLE_COLUMN: usize = 9;

/// Streaming extractor for a single genotype row
#[derive(Debug, Default)]
pub struct GenotypeExtractor {
    /// Lines read during the last extraction (for reporting)
    pub lines_scanned: usize,
}

impl GenotypeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find `rsid` in the matrix and pair its genotypes with the sample names
    ///
    /// # Returns
    /// * `Ok(rows)` - One row per sample, in header order
    /// * `Err(AgvError::NotFound)` - End of stream reached without a match
    /// * `Err(AgvError::Parse)` - Matched row has no header or a column count mismatch
    pub fn extract<R: BufRead>(&mut self, reader: R, rsid: &str) -> Result<Vec<GenotypeRow>> {
        let mut sample_names: Option<Vec<String>> = None;
        self.lines_scanned = 0;

        for (index, line_result) in reader.lines().enumerate() {
            let line_number = index + 1;
            self.lines_scanned = line_number;

            let raw = line_result?;
            let line = raw.trim();

            if line.starts_with(HEADER_PREFIX) {
                if sample_names.is_none() {
                    let names: Vec<String> = line
                        .split('\t')
                        .skip(FIRST_SAMPLE_COLUMN)
                        .map(str::to_string)
                        .collect();
                    debug!("Genotype matrix header lists {} samples", names.len());
                    sample_names = Some(names);
                }
                continue;
            }

            // Meta-information lines and blank lines
            if line.starts_with('#') || line.is_empty() {
                continue;
            }

            let mut fields = line.split('\t');
            let id = fields.nth(ID_COLUMN).ok_or_else(|| {
                AgvError::parse(line_number, "Genotype matrix row has fewer than 3 columns")
            })?;

            if id != rsid {
                continue;
            }

            let samples = sample_names.as_ref().ok_or_else(|| {
                AgvError::parse(line_number, format!("{} found before #CHROM header", rsid))
            })?;

            // `fields` is positioned after ID; skip POS..FORMAT remainder
            let genotypes: Vec<&str> = fields.skip(FIRST_SAMPLE_COLUMN - ID_COLUMN - 1).collect();

            if genotypes.len() != samples.len() {
                return Err(AgvError::parse(
                    line_number,
                    format!(
                        "{} has {} genotypes but header lists {} samples",
                        rsid,
                        genotypes.len(),
                        samples.len()
                    ),
                ));
            }

            info!(
                "Found {} at line {} with {} sample genotypes",
                rsid,
                line_number,
                genotypes.len()
            );

            return Ok(samples
                .iter()
                .zip(genotypes)
                .map(|(genetic_id, genotype)| GenotypeRow {
                    genetic_id: genetic_id.clone(),
                    genotype: genotype.to_string(),
                })
                .collect());
        }

        Err(AgvError::NotFound {
            rsid: rsid.to_string(),
        })
    }
}
