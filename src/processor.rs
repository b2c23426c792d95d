// ==============================================================================
// processor.rs - Variant Query Pipeline
// ==============================================================================
// Description: Resolves a variant, finds its LD proxies and, for AGVs, builds
//              the genotype summary (archaic genotypes + regional frequencies)
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Pipeline:
//   1. Resolve the query against the AGV catalog
//   2. LD proxies from the resolved chromosome's LD table (skipped when an
//      rsID's chromosome could not be resolved)
//   3. AGV only: extract genotypes -> join annotations -> archaic genotypes
//      + region x time-bin frequencies
// A genotype row missing from the matrix leaves the summary empty; every
// other failure aborts the query.
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::archaic::{split_archaic, ArchaicGenotypes};
use crate::config::AppConfig;
use crate::error::{AgvError, Result};
use crate::fetcher::TableSource;
use crate::frequency::FrequencyTable;
use crate::joiner::join_annotations;
use crate::models::{AgvRecord, JoinedGenotypeRow, LdRecord, SampleAnnotation};
use crate::parsers::{AnnotationParser, CatalogParser, GenotypeExtractor};
use crate::proxies::LdProxyFinder;
use crate::resolver::{AgvCatalog, ChromosomeLookup, Resolution, VariantQuery, VariantResolver};

/// Static tables loaded once and shared by every query
pub struct ReferenceData {
    pub catalog: AgvCatalog,
    pub annotations: Vec<SampleAnnotation>,
}

impl ReferenceData {
    /// Load the AGV catalog and sample annotations named in the configuration
    pub fn load(config: &AppConfig) -> Result<Self> {
        let mut catalog_parser = CatalogParser::new().with_max_errors(config.max_catalog_errors);
        let records = catalog_parser.parse_path(&config.agv_catalog)?;
        if catalog_parser.skipped_count > 0 {
            warn!("Skipped {} unparseable AGV catalog rows", catalog_parser.skipped_count);
        }

        let annotations = AnnotationParser::parse_path(&config.sample_annotation)?;

        let catalog = AgvCatalog::new(records);
        if catalog.is_empty() {
            warn!("AGV catalog {:?} has no usable rows; every query will be a non-AGV", config.agv_catalog);
        }

        info!(
            "Reference data loaded: {} AGVs, {} sample annotations",
            catalog.len(),
            annotations.len()
        );

        Ok(Self {
            catalog,
            annotations,
        })
    }
}

/// Everything known about a queried AGV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgvSummary {
    pub record: AgvRecord,
    pub archaic: ArchaicGenotypes,
    pub frequencies: FrequencyTable,
    /// Every sample's genotype with its annotation (export table)
    pub genotypes: Vec<JoinedGenotypeRow>,
}

/// Result of one variant query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub query_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub query: VariantQuery,
    pub resolution: Resolution,
    /// Present only for AGVs whose genotypes were retrieved
    pub summary: Option<AgvSummary>,
    /// `None` when the chromosome was unknown and no LD table was read
    pub proxies: Option<Vec<LdRecord>>,
    pub message: String,
}

impl QueryReport {
    pub fn has_proxies(&self) -> bool {
        self.proxies.as_ref().map_or(false, |p| !p.is_empty())
    }
}

/// Runs variant queries against the reference data and per-chromosome sources
pub struct QueryProcessor<'a> {
    reference: &'a ReferenceData,
    ld_source: &'a dyn TableSource,
    genotype_source: &'a dyn TableSource,
    lookup: Option<&'a dyn ChromosomeLookup>,
}

impl<'a> QueryProcessor<'a> {
    pub fn new(
        reference: &'a ReferenceData,
        ld_source: &'a dyn TableSource,
        genotype_source: &'a dyn TableSource,
        lookup: Option<&'a dyn ChromosomeLookup>,
    ) -> Self {
        Self {
            reference,
            ld_source,
            genotype_source,
            lookup,
        }
    }

    /// Validate raw inputs and run the query
    pub fn process_inputs(
        &self,
        chromosome: Option<&str>,
        position: Option<&str>,
        rsid: Option<&str>,
    ) -> Result<QueryReport> {
        let query = VariantQuery::from_inputs(chromosome, position, rsid)?;
        self.process(&query)
    }

    /// Main processing pipeline
    pub fn process(&self, query: &VariantQuery) -> Result<QueryReport> {
        let query_id = Uuid::new_v4();
        info!("Processing query {} for variant {}", query_id, query);

        // 1. Resolve
        let resolver = VariantResolver::new(&self.reference.catalog, self.lookup);
        let resolution = resolver.resolve(query);

        // 2. LD proxies
        let proxies = match resolution.chromosome() {
            Some(chromosome) => {
                let finder = LdProxyFinder::new(self.ld_source);
                Some(finder.find(chromosome, &LdProxyFinder::filter_for(query))?)
            }
            None => {
                warn!("Chromosome for {} unresolved, skipping LD proxy lookup", query);
                None
            }
        };

        // 3. AGV summary
        let summary = match resolution.agv() {
            Some(record) => self.summarize(record)?,
            None => None,
        };

        let message = compose_message(query, &resolution, summary.is_some(), proxies.as_deref());
        info!("Query {} complete: {}", query_id, message);

        Ok(QueryReport {
            query_id,
            generated_at: Utc::now(),
            query: query.clone(),
            resolution,
            summary,
            proxies,
            message,
        })
    }

    /// Genotype summary for an AGV, or `None` when its row is absent from the matrix
    fn summarize(&self, record: &AgvRecord) -> Result<Option<AgvSummary>> {
        let reader = self.genotype_source.open(record.chromosome)?;
        let mut extractor = GenotypeExtractor::new();

        let genotypes = match extractor.extract(reader, &record.rsid) {
            Ok(genotypes) => genotypes,
            Err(AgvError::NotFound { rsid }) => {
                warn!(
                    "{} is an AGV but has no row in the chromosome {} genotype matrix",
                    rsid, record.chromosome
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let joined = join_annotations(genotypes, &self.reference.annotations);
        let archaic = split_archaic(&joined);
        let frequencies = FrequencyTable::compute(&joined);

        info!(
            "AGV summary for {}: {} samples, {} archaic genotypes",
            record.rsid,
            joined.len(),
            archaic.len()
        );

        Ok(Some(AgvSummary {
            record: record.clone(),
            archaic,
            frequencies,
            genotypes: joined,
        }))
    }
}

/// User-facing outcome sentence
fn compose_message(
    query: &VariantQuery,
    resolution: &Resolution,
    has_summary: bool,
    proxies: Option<&[LdRecord]>,
) -> String {
    let found_proxies = proxies.map_or(false, |p| !p.is_empty());

    match (resolution.is_agv(), has_summary, proxies) {
        (true, true, _) if found_proxies => format!(
            "Variant {} is an AGV and LD proxies were found. Both AGV summary results and LD proxies are displayed below.",
            query
        ),
        (true, true, _) => format!(
            "Variant {} is an AGV and summary results are displayed below. However, no LD proxies found.",
            query
        ),
        (true, false, _) => {
            let proxy_sentence = if found_proxies {
                "LD proxies were found and are displayed below."
            } else {
                "No LD proxies found."
            };
            format!(
                "Variant {} is an AGV, but its genotypes could not be retrieved. {}",
                query, proxy_sentence
            )
        }
        (false, _, None) => format!(
            "Variant {} is not an AGV and its chromosome could not be resolved, so no LD proxies could be retrieved.",
            query
        ),
        (false, _, Some(_)) if found_proxies => format!(
            "Variant {} is not an AGV, but LD proxies were found and are displayed below.",
            query
        ),
        (false, _, Some(_)) => format!("Variant {} is not an AGV and no LD proxies were found.", query),
    }
}
