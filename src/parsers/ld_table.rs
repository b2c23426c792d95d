// ==============================================================================
// parsers/ld_table.rs - Precomputed LD Table Reader
// ==============================================================================
// Description: Streams a per-chromosome TopLD-derived table and decodes only
//              the rows matching the variant of interest
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited with header. List columns (populations, r2, D', corr)
// are comma-separated and aligned element by element.
// Example:
//   chr  LDV_pos   LDV_rsID  LDV_ref  LDV_alt  AGV_pos   AGV_rsID  ...  populations  r2         D'         corr
//   11   63290000  rs111     A        G        63290453  rs1000    ...  AFR,EUR      0.91,0.85  0.99,0.97  0.95,0.92
// ==============================================================================

use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::debug;

use crate::error::{AgvError, Result};
use crate::models::{Chromosome, LdRecord};

/// Columns every LD table must provide
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "chr", "LDV_pos", "LDV_rsID", "LDV_ref", "LDV_alt", "AGV_pos", "AGV_rsID", "AGV_ref",
    "AGV_alt", "populations", "r2", "D'", "corr",
];

/// Separator inside list-valued columns
const LIST_SEPARATOR: char = ',';

/// Row selection applied while scanning an LD table
#[derive(Debug, Clone, PartialEq)]
pub enum LdFilter {
    /// `LDV_rsID` equals the rsID
    RsId(String),
    /// `chr` and `LDV_pos` equal the coordinates
    Position { chromosome: Chromosome, position: u64 },
}

/// Header column indices, in REQUIRED_COLUMNS order
struct Columns([usize; 13]);

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self> {
        let mut indices = [0usize; 13];
        for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    AgvError::parse(1, format!("LD table missing required column '{}'", name))
                })?;
        }
        Ok(Self(indices))
    }

    fn get<'r>(&self, row: &'r StringRecord, column: usize) -> &'r str {
        row.get(self.0[column]).unwrap_or("").trim()
    }
}

const CHR: usize = 0;
const LDV_POS: usize = 1;
const LDV_RSID: usize = 2;
const LDV_REF: usize = 3;
const LDV_ALT: usize = 4;
const AGV_POS: usize = 5;
const AGV_RSID: usize = 6;
const AGV_REF: usize = 7;
const AGV_ALT: usize = 8;
const POPULATIONS: usize = 9;
const R2: usize = 10;
const D_PRIME: usize = 11;
const CORR: usize = 12;

impl LdFilter {
    /// Cheap check on raw fields; non-matching rows are never decoded
    fn matches(&self, row: &StringRecord, columns: &Columns) -> bool {
        match self {
            LdFilter::RsId(rsid) => columns.get(row, LDV_RSID) == rsid,
            LdFilter::Position { chromosome, position } => {
                columns.get(row, LDV_POS).parse::<u64>().ok() == Some(*position)
                    && columns.get(row, CHR).parse::<Chromosome>().ok() == Some(*chromosome)
            }
        }
    }
}

/// Reader for one chromosome's LD table
pub struct LdTableReader;

impl LdTableReader {
    /// Scan the table and return every row matching `filter`, in file order
    pub fn filter<R: Read>(reader: R, filter: &LdFilter) -> Result<Vec<LdRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let header = reader.headers()?.clone();
        if header.is_empty() {
            // Empty payload: no rows, no proxies
            return Ok(Vec::new());
        }
        let columns = Columns::from_header(&header)?;

        let mut matches = Vec::new();
        let mut scanned = 0usize;

        for result in reader.records() {
            let row = result?;
            scanned += 1;

            if !filter.matches(&row, &columns) {
                continue;
            }

            let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
            if row.len() < header.len() {
                return Err(AgvError::parse(
                    line,
                    format!("LD row has {} columns but header lists {}", row.len(), header.len()),
                ));
            }
            matches.push(Self::decode(&row, &columns, line)?);
        }

        debug!("Scanned {} LD rows, {} matched {:?}", scanned, matches.len(), filter);
        Ok(matches)
    }

    fn decode(row: &StringRecord, columns: &Columns, line: usize) -> Result<LdRecord> {
        let chromosome: Chromosome = columns
            .get(row, CHR)
            .parse()
            .map_err(|e: AgvError| AgvError::parse(line, e.to_string()))?;

        let populations: Vec<String> = split_list(columns.get(row, POPULATIONS))
            .map(str::to_string)
            .collect();
        if populations.is_empty() {
            return Err(AgvError::parse(line, "LD row lists no populations"));
        }
        let r2 = parse_metrics(columns.get(row, R2), "r2", line)?;
        let d_prime = parse_metrics(columns.get(row, D_PRIME), "D'", line)?;
        let corr = parse_metrics(columns.get(row, CORR), "corr", line)?;

        if r2.len() != populations.len()
            || d_prime.len() != populations.len()
            || corr.len() != populations.len()
        {
            return Err(AgvError::parse(
                line,
                format!(
                    "LD metrics not aligned with populations ({} populations, {} r2, {} D', {} corr)",
                    populations.len(),
                    r2.len(),
                    d_prime.len(),
                    corr.len()
                ),
            ));
        }

        Ok(LdRecord {
            chromosome,
            ldv_pos: parse_position(columns.get(row, LDV_POS), "LDV_pos", line)?,
            ldv_rsid: columns.get(row, LDV_RSID).to_string(),
            ldv_ref: columns.get(row, LDV_REF).to_string(),
            ldv_alt: columns.get(row, LDV_ALT).to_string(),
            agv_pos: parse_position(columns.get(row, AGV_POS), "AGV_pos", line)?,
            agv_rsid: columns.get(row, AGV_RSID).to_string(),
            agv_ref: columns.get(row, AGV_REF).to_string(),
            agv_alt: columns.get(row, AGV_ALT).to_string(),
            populations,
            r2,
            d_prime,
            corr,
        })
    }
}

fn split_list(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn parse_metrics(field: &str, name: &str, line: usize) -> Result<Vec<f64>> {
    split_list(field)
        .map(|value| {
            value
                .parse::<f64>()
                .map_err(|_| AgvError::parse(line, format!("Invalid {} value: {}", name, value)))
        })
        .collect()
}

fn parse_position(field: &str, name: &str, line: usize) -> Result<u64> {
    field
        .parse::<u64>()
        .map_err(|_| AgvError::parse(line, format!("Invalid {}: {}", name, field)))
}
