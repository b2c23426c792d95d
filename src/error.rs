// ==============================================================================
// error.rs - AGV Catalog Error Types
// ==============================================================================
// Description: Error taxonomy shared by variant resolution, table retrieval,
//              genotype extraction and export
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use thiserror::Error;

/// Errors that can occur while answering a variant query
#[derive(Error, Debug)]
pub enum AgvError {
    /// Both or neither of (chromosome, position) and rsID were supplied
    #[error("Please enter either chromosome and position OR rsID, not both.")]
    InvalidInput,

    #[error("Invalid position: {0}. Position must be a positive integer.")]
    InvalidPosition(String),

    #[error("Invalid chromosome: {0}. Chromosome must be between 1-22 or X.")]
    InvalidChromosome(String),

    /// No data location configured for this chromosome
    #[error("No {dataset} location configured for chromosome {chromosome}")]
    Mapping { dataset: String, chromosome: String },

    /// Transport failure (connection error or non-success HTTP status)
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Target rsID absent from the chromosome's genotype matrix
    #[error("Variant with rsID {rsid} not found in genotype matrix")]
    NotFound { rsid: String },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgvError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// True for failures that reject the user's input before any lookup
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AgvError::InvalidInput | AgvError::InvalidPosition(_) | AgvError::InvalidChromosome(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AgvError>;
