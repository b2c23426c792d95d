// ==============================================================================
// lib.rs - AGV Proxy Catalog Library
// ==============================================================================
// Description: Library interface for variant resolution, LD proxy lookup and
//              ancient allele frequency summaries
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

pub mod archaic;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod frequency;
pub mod joiner;
pub mod models;
pub mod output;
pub mod parsers;
pub mod processor;
pub mod proxies;
pub mod resolver;

pub use error::{AgvError, Result};
pub use processor::{QueryProcessor, QueryReport, ReferenceData};
