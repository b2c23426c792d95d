// ==============================================================================
// models.rs - AGV Data Models
// ==============================================================================
// Description: Typed rows for the AGV catalog, LD tables, genotype matrices,
//              sample annotations and region x time-bin frequency cells
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AgvError;

/// Chromosome label (1-22 or X)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Chromosome {
    Autosome(u8),
    X,
}

impl Chromosome {
    /// Key used by the chromosome -> location mappings (e.g., "chr11")
    pub fn location_key(&self) -> String {
        format!("chr{}", self)
    }
}

impl FromStr for Chromosome {
    type Err = AgvError;

    /// Parse a chromosome, stripping a leading case-insensitive "chr" prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let stripped = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
            _ => trimmed,
        };

        if stripped == "X" {
            return Ok(Chromosome::X);
        }

        // Reject signs and leading zeros so only the canonical "1".."22" pass
        if stripped.is_empty()
            || stripped.starts_with('0')
            || !stripped.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AgvError::InvalidChromosome(stripped.to_string()));
        }

        match stripped.parse::<u8>() {
            Ok(n) if (1..=22).contains(&n) => Ok(Chromosome::Autosome(n)),
            _ => Err(AgvError::InvalidChromosome(stripped.to_string())),
        }
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chromosome::Autosome(n) => write!(f, "{}", n),
            Chromosome::X => write!(f, "X"),
        }
    }
}

impl TryFrom<String> for Chromosome {
    type Error = AgvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chromosome> for String {
    fn from(chromosome: Chromosome) -> Self {
        chromosome.to_string()
    }
}

/// Variant present in the ancient genotyped variant catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgvRecord {
    #[serde(rename = "AGV_chr")]
    pub chromosome: Chromosome,

    /// 1-based position (hg38)
    #[serde(rename = "AGV_pos")]
    pub position: u64,

    #[serde(rename = "AGV_rsID")]
    pub rsid: String,

    #[serde(rename = "AGV_ref")]
    pub ref_allele: String,

    #[serde(rename = "AGV_alt")]
    pub alt_allele: String,
}

/// Row of a precomputed LD table: a variant of interest and an AGV in LD with it
///
/// `populations`, `r2`, `d_prime` and `corr` are parallel lists; index `i` of
/// each metric belongs to `populations[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdRecord {
    pub chromosome: Chromosome,
    pub ldv_pos: u64,
    pub ldv_rsid: String,
    pub ldv_ref: String,
    pub ldv_alt: String,
    pub agv_pos: u64,
    pub agv_rsid: String,
    pub agv_ref: String,
    pub agv_alt: String,
    pub populations: Vec<String>,
    pub r2: Vec<f64>,
    pub d_prime: Vec<f64>,
    pub corr: Vec<f64>,
}

impl LdRecord {
    /// Strongest r² across ancestry groups (ranking key)
    pub fn max_r2(&self) -> f64 {
        self.r2.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Genotype token marking a missing call
pub const MISSING_GENOTYPE: &str = "./.";

/// One sample's call at the queried AGV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenotypeRow {
    #[serde(rename = "Genetic_ID")]
    pub genetic_id: String,

    /// Raw genotype token (e.g., "0/1", "1/1", "./.")
    #[serde(rename = "Genotype")]
    pub genotype: String,
}

impl GenotypeRow {
    pub fn is_missing(&self) -> bool {
        self.genotype == MISSING_GENOTYPE
    }

    /// Number of alt alleles: every '1' in the token counts once
    pub fn alt_allele_count(&self) -> usize {
        self.genotype.matches('1').count()
    }
}

/// Geographic region of a sample
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Region {
    Africa,
    Americas,
    EastAsia,
    Europe,
    Oceania,
    SouthAsia,
    WestAsia,
    /// Any label outside the seven summarized regions
    Other(String),
}

impl Region {
    /// Regions summarized in the frequency table, in display order
    pub const SUMMARIZED: [Region; 7] = [
        Region::Africa,
        Region::Americas,
        Region::EastAsia,
        Region::Europe,
        Region::Oceania,
        Region::SouthAsia,
        Region::WestAsia,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Region::Africa => "Africa",
            Region::Americas => "Americas",
            Region::EastAsia => "East Asia",
            Region::Europe => "Europe",
            Region::Oceania => "Oceania",
            Region::SouthAsia => "South Asia",
            Region::WestAsia => "West Asia",
            Region::Other(label) => label,
        }
    }
}

impl From<String> for Region {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Africa" => Region::Africa,
            "Americas" => Region::Americas,
            "East Asia" => Region::EastAsia,
            "Europe" => Region::Europe,
            "Oceania" => Region::Oceania,
            "South Asia" => Region::SouthAsia,
            "West Asia" => Region::WestAsia,
            _ => Region::Other(value),
        }
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.as_str().to_string()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample metadata row from the AADR annotation table
///
/// Empty fields deserialize to `None`. Columns not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAnnotation {
    #[serde(rename = "Genetic_ID")]
    pub genetic_id: String,

    /// Individual the sample was taken from; several Genetic_IDs may share one
    #[serde(rename = "Specimen_ID")]
    pub specimen_id: Option<String>,

    #[serde(rename = "Region")]
    pub region: Option<Region>,

    /// Mean estimated age in years before present (0 = present-day)
    #[serde(rename = "Date_mean", deserialize_with = "csv::invalid_option", default)]
    pub date_mean: Option<f64>,

    /// Sequencing/calling pipeline (e.g., "Shotgun.diploid")
    #[serde(rename = "Data_source")]
    pub data_source: Option<String>,

    #[serde(rename = "Location")]
    pub location: Option<String>,
}

/// Genotype row left-joined with its sample annotation (if any)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedGenotypeRow {
    pub genotype: GenotypeRow,
    pub annotation: Option<SampleAnnotation>,
}

impl JoinedGenotypeRow {
    pub fn genetic_id(&self) -> &str {
        &self.genotype.genetic_id
    }

    pub fn specimen_id(&self) -> Option<&str> {
        self.annotation.as_ref()?.specimen_id.as_deref()
    }

    pub fn region(&self) -> Option<&Region> {
        self.annotation.as_ref()?.region.as_ref()
    }

    pub fn date_mean(&self) -> Option<f64> {
        self.annotation.as_ref()?.date_mean
    }

    pub fn data_source(&self) -> Option<&str> {
        self.annotation.as_ref()?.data_source.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.annotation.as_ref()?.location.as_deref()
    }
}

/// Sample-age interval in years before present
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBin {
    /// Column identifier (e.g., "Present", "1000")
    pub id: &'static str,
    /// Human-readable label (e.g., "(0-1 ka]")
    pub label: &'static str,
    pub lower: u32,
    pub upper: u32,
}

impl TimeBin {
    const fn new(id: &'static str, label: &'static str, lower: u32, upper: u32) -> Self {
        Self { id, label, lower, upper }
    }

    pub fn is_present_day(&self) -> bool {
        self.lower == 0 && self.upper == 0
    }

    /// Present-day bin matches exactly 0; all others are (lower, upper]
    pub fn contains(&self, date_mean: f64) -> bool {
        if self.is_present_day() {
            date_mean == 0.0
        } else {
            date_mean > f64::from(self.lower) && date_mean <= f64::from(self.upper)
        }
    }
}

/// Fixed time bins, in column order
pub const TIME_BINS: [TimeBin; 12] = [
    TimeBin::new("Present", "Present", 0, 0),
    TimeBin::new("1000", "(0-1 ka]", 0, 1_000),
    TimeBin::new("2000", "(1-2 ka]", 1_000, 2_000),
    TimeBin::new("3000", "(2-3 ka]", 2_000, 3_000),
    TimeBin::new("4000", "(3-4 ka]", 3_000, 4_000),
    TimeBin::new("5000", "(4-5 ka]", 4_000, 5_000),
    TimeBin::new("10000", "(5-10 ka]", 5_000, 10_000),
    TimeBin::new("15000", "(10-15 ka]", 10_000, 15_000),
    TimeBin::new("20000", "(15-20 ka]", 15_000, 20_000),
    TimeBin::new("30000", "(20-30 ka]", 20_000, 30_000),
    TimeBin::new("40000", "(30-40 ka]", 30_000, 40_000),
    TimeBin::new("50000", "(40-50 ka]", 40_000, 50_000),
];

/// Allele frequency summary for one region x time-bin cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrequencyCell {
    /// No samples fall in this cell; frequency is undefined
    Blank,
    /// Samples present. `frequency` is `None` when every call was missing
    Computed {
        frequency: Option<f64>,
        samples: usize,
    },
}

impl FrequencyCell {
    pub fn is_blank(&self) -> bool {
        matches!(self, FrequencyCell::Blank)
    }
}

impl fmt::Display for FrequencyCell {
    /// Renders "<frequency rounded to 4 decimals> (<samples>)", or "" when blank
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyCell::Blank => Ok(()),
            FrequencyCell::Computed { frequency, samples } => {
                let rendered = frequency.map(format_frequency).unwrap_or_default();
                write!(f, "{} ({})", rendered, samples)
            }
        }
    }
}

/// Round to 4 decimals, trimming trailing zeros but keeping one decimal place
fn format_frequency(value: f64) -> String {
    let fixed = format!("{:.4}", value);
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}
