// ==============================================================================
// output.rs - Query Result Export
// ==============================================================================
// Description: Writes the per-sample genotype table and LD proxy list as CSV,
//              and the whole query report as JSON
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Artifacts:
//   AGV_genotypes.csv  Genetic_ID, Genotype, Specimen_ID, Region, Date_mean,
//                      Data_source, Location
//   AGVs_in_LD.csv     chr, LDV_pos, LDV_rsID, LDV_ref, LDV_alt, AGV_pos,
//                      AGV_rsID, AGV_ref, AGV_alt, populations, r2, D', corr
//                      (list columns comma-joined)
//   AGV_report_<query_id>.json
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::{GenotypeRow, JoinedGenotypeRow, LdRecord};
use crate::processor::QueryReport;

pub const GENOTYPES_FILE: &str = "AGV_genotypes.csv";
pub const PROXIES_FILE: &str = "AGVs_in_LD.csv";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Genotype and LD proxy tables (spreadsheets, R, pandas)
    Csv,
    /// Full query report (web APIs and JavaScript)
    Json,
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Flat genotype export row
#[derive(Debug, Serialize)]
struct GenotypeExportRow<'a> {
    #[serde(rename = "Genetic_ID")]
    genetic_id: &'a str,
    #[serde(rename = "Genotype")]
    genotype: &'a str,
    #[serde(rename = "Specimen_ID")]
    specimen_id: Option<&'a str>,
    #[serde(rename = "Region")]
    region: Option<&'a str>,
    #[serde(rename = "Date_mean")]
    date_mean: Option<f64>,
    #[serde(rename = "Data_source")]
    data_source: Option<&'a str>,
    #[serde(rename = "Location")]
    location: Option<&'a str>,
}

impl<'a> From<&'a JoinedGenotypeRow> for GenotypeExportRow<'a> {
    fn from(row: &'a JoinedGenotypeRow) -> Self {
        Self {
            genetic_id: row.genetic_id(),
            genotype: &row.genotype.genotype,
            specimen_id: row.specimen_id(),
            region: row.region().map(|r| r.as_str()),
            date_mean: row.date_mean(),
            data_source: row.data_source(),
            location: row.location(),
        }
    }
}

/// Flat LD proxy export row
#[derive(Debug, Serialize)]
struct ProxyExportRow<'a> {
    chr: String,
    #[serde(rename = "LDV_pos")]
    ldv_pos: u64,
    #[serde(rename = "LDV_rsID")]
    ldv_rsid: &'a str,
    #[serde(rename = "LDV_ref")]
    ldv_ref: &'a str,
    #[serde(rename = "LDV_alt")]
    ldv_alt: &'a str,
    #[serde(rename = "AGV_pos")]
    agv_pos: u64,
    #[serde(rename = "AGV_rsID")]
    agv_rsid: &'a str,
    #[serde(rename = "AGV_ref")]
    agv_ref: &'a str,
    #[serde(rename = "AGV_alt")]
    agv_alt: &'a str,
    populations: String,
    r2: String,
    #[serde(rename = "D'")]
    d_prime: String,
    corr: String,
}

/// Comma-joined LD metric list (e.g., "0.8,0.95")
pub fn join_metrics(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl<'a> From<&'a LdRecord> for ProxyExportRow<'a> {
    fn from(record: &'a LdRecord) -> Self {
        Self {
            chr: record.chromosome.to_string(),
            ldv_pos: record.ldv_pos,
            ldv_rsid: &record.ldv_rsid,
            ldv_ref: &record.ldv_ref,
            ldv_alt: &record.ldv_alt,
            agv_pos: record.agv_pos,
            agv_rsid: &record.agv_rsid,
            agv_ref: &record.agv_ref,
            agv_alt: &record.agv_alt,
            populations: record.populations.join(","),
            r2: join_metrics(&record.r2),
            d_prime: join_metrics(&record.d_prime),
            corr: join_metrics(&record.corr),
        }
    }
}

/// Write the per-sample genotype table as CSV
pub fn write_genotypes<W: Write>(writer: W, rows: &[JoinedGenotypeRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(GenotypeExportRow::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read a genotype export back into sample identifiers and genotypes, in order
pub fn read_genotypes<R: Read>(reader: R) -> Result<Vec<GenotypeRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: GenotypeRow = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write the ranked LD proxy list as CSV
pub fn write_proxies<W: Write>(writer: W, records: &[LdRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(ProxyExportRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the whole report as pretty-printed JSON
pub fn write_report_json<W: Write>(writer: W, report: &QueryReport) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Writes query artifacts into an output directory
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Generate every requested format
    ///
    /// # Returns
    /// * HashMap of format -> files written (CSV artifacts are skipped when
    ///   the report has nothing to put in them)
    pub fn generate(
        &self,
        report: &QueryReport,
        formats: &[OutputFormat],
    ) -> Result<HashMap<OutputFormat, Vec<PathBuf>>> {
        fs::create_dir_all(&self.output_dir)?;

        let mut result = HashMap::new();
        for format in formats {
            let paths = match format {
                OutputFormat::Csv => self.generate_csv(report)?,
                OutputFormat::Json => vec![self.generate_json(report)?],
            };
            result.insert(*format, paths);
        }

        Ok(result)
    }

    fn generate_csv(&self, report: &QueryReport) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        match &report.summary {
            Some(summary) => {
                let path = self.output_dir.join(GENOTYPES_FILE);
                write_genotypes(File::create(&path)?, &summary.genotypes)?;
                info!("Wrote {} sample genotypes to {:?}", summary.genotypes.len(), path);
                written.push(path);
            }
            None => info!("No AGV genotypes to export"),
        }

        match report.proxies.as_deref() {
            Some(proxies) if !proxies.is_empty() => {
                let path = self.output_dir.join(PROXIES_FILE);
                write_proxies(File::create(&path)?, proxies)?;
                info!("Wrote {} LD proxies to {:?}", proxies.len(), path);
                written.push(path);
            }
            _ => info!("No LD proxies to export"),
        }

        Ok(written)
    }

    fn generate_json(&self, report: &QueryReport) -> Result<PathBuf> {
        let path = self.output_dir.join(format!(
            "AGV_report_{}.{}",
            report.query_id,
            OutputFormat::Json.extension()
        ));
        write_report_json(File::create(&path)?, report)?;
        info!("Wrote query report to {:?}", path);
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
