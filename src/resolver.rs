// ==============================================================================
// resolver.rs - Variant Resolution
// ==============================================================================
// Description: Validates user input and resolves it against the AGV catalog,
//              falling back to an rsID -> chromosome lookup for non-AGVs
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Cursor};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AgvError, Result};
use crate::fetcher::Transport;
use crate::models::{AgvRecord, Chromosome};
use crate::parsers::decompressing_reader;

/// Validated user query: coordinates or rsID, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum VariantQuery {
    Coordinates { chromosome: Chromosome, position: u64 },
    RsId { rsid: String },
}

impl VariantQuery {
    /// Build a query from raw form inputs
    ///
    /// Blank strings count as not supplied. Exactly one of
    /// (chromosome + position) or rsID must be given.
    pub fn from_inputs(
        chromosome: Option<&str>,
        position: Option<&str>,
        rsid: Option<&str>,
    ) -> Result<Self> {
        fn supplied(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }
        let (chromosome, position, rsid) = (supplied(chromosome), supplied(position), supplied(rsid));

        match (chromosome, position, rsid) {
            (Some(chromosome), Some(position), None) => {
                let chromosome: Chromosome = chromosome.parse()?;
                let position = position
                    .parse::<u64>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| AgvError::InvalidPosition(position.to_string()))?;
                Ok(VariantQuery::Coordinates { chromosome, position })
            }
            (None, None, Some(rsid)) => Ok(VariantQuery::RsId {
                rsid: rsid.to_string(),
            }),
            _ => Err(AgvError::InvalidInput),
        }
    }

    pub fn rsid(&self) -> Option<&str> {
        match self {
            VariantQuery::RsId { rsid } => Some(rsid),
            VariantQuery::Coordinates { .. } => None,
        }
    }
}

impl fmt::Display for VariantQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantQuery::Coordinates { chromosome, position } => write!(f, "{}:{}", chromosome, position),
            VariantQuery::RsId { rsid } => f.write_str(rsid),
        }
    }
}

/// In-memory AGV catalog indexed by coordinates and rsID (first row wins)
#[derive(Debug, Default)]
pub struct AgvCatalog {
    records: Vec<AgvRecord>,
    by_position: HashMap<(Chromosome, u64), usize>,
    by_rsid: HashMap<String, usize>,
}

impl AgvCatalog {
    pub fn new(records: Vec<AgvRecord>) -> Self {
        let mut by_position = HashMap::with_capacity(records.len());
        let mut by_rsid = HashMap::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            by_position
                .entry((record.chromosome, record.position))
                .or_insert(index);
            by_rsid.entry(record.rsid.clone()).or_insert(index);
        }

        Self {
            records,
            by_position,
            by_rsid,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_position(&self, chromosome: Chromosome, position: u64) -> Option<&AgvRecord> {
        self.by_position
            .get(&(chromosome, position))
            .map(|&index| &self.records[index])
    }

    pub fn by_rsid(&self, rsid: &str) -> Option<&AgvRecord> {
        self.by_rsid.get(rsid).map(|&index| &self.records[index])
    }
}

/// External rsID -> chromosome lookup
///
/// `Ok(None)` means the key is absent; `Err` means the lookup itself failed.
pub trait ChromosomeLookup: Send + Sync {
    fn chromosome_for(&self, rsid: &str) -> Result<Option<Chromosome>>;
}

/// Downloads a gzipped `rsID<TAB>chr` table and scans it for the key
pub struct RemoteChromosomeLookup {
    url: String,
    transport: Arc<dyn Transport>,
}

impl RemoteChromosomeLookup {
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    /// Scan a decompressed lookup table for `rsid`
    fn scan<R: BufRead>(reader: R, rsid: &str) -> Result<Option<Chromosome>> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.trim_end().split('\t');

            if fields.next() != Some(rsid) {
                continue;
            }

            let value = fields.next().unwrap_or("");
            let chromosome = value
                .parse::<Chromosome>()
                .map_err(|e| AgvError::parse(index + 1, format!("rsID lookup for {}: {}", rsid, e)))?;
            return Ok(Some(chromosome));
        }

        Ok(None)
    }
}

impl ChromosomeLookup for RemoteChromosomeLookup {
    fn chromosome_for(&self, rsid: &str) -> Result<Option<Chromosome>> {
        debug!("Looking up chromosome for {} via {}", rsid, self.url);
        let payload = self.transport.get(&self.url)?;
        let reader = decompressing_reader(Cursor::new(payload))?;
        Self::scan(reader, rsid)
    }
}

/// Outcome of the external chromosome lookup for a non-AGV rsID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChromosomeStatus {
    Resolved { chromosome: Chromosome },
    /// Lookup succeeded but the rsID has no entry
    Missing,
    /// Lookup could not be performed (transport failure, no lookup configured)
    LookupFailed { message: String },
}

/// Canonical descriptor produced by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Query matched a catalog AGV
    Agv { record: AgvRecord },
    /// Coordinates not in the catalog; passed through verbatim
    Coordinates { chromosome: Chromosome, position: u64 },
    /// rsID not in the catalog; chromosome from the external lookup
    RsId { rsid: String, chromosome: ChromosomeStatus },
}

impl Resolution {
    pub fn is_agv(&self) -> bool {
        matches!(self, Resolution::Agv { .. })
    }

    pub fn agv(&self) -> Option<&AgvRecord> {
        match self {
            Resolution::Agv { record } => Some(record),
            _ => None,
        }
    }

    /// Chromosome for table selection, if known
    pub fn chromosome(&self) -> Option<Chromosome> {
        match self {
            Resolution::Agv { record } => Some(record.chromosome),
            Resolution::Coordinates { chromosome, .. } => Some(*chromosome),
            Resolution::RsId {
                chromosome: ChromosomeStatus::Resolved { chromosome },
                ..
            } => Some(*chromosome),
            Resolution::RsId { .. } => None,
        }
    }

    pub fn position(&self) -> Option<u64> {
        match self {
            Resolution::Agv { record } => Some(record.position),
            Resolution::Coordinates { position, .. } => Some(*position),
            Resolution::RsId { .. } => None,
        }
    }

    pub fn rsid(&self) -> Option<&str> {
        match self {
            Resolution::Agv { record } => Some(&record.rsid),
            Resolution::Coordinates { .. } => None,
            Resolution::RsId { rsid, .. } => Some(rsid),
        }
    }
}

/// Resolves queries against the catalog and the optional external lookup
pub struct VariantResolver<'a> {
    catalog: &'a AgvCatalog,
    lookup: Option<&'a dyn ChromosomeLookup>,
}

impl<'a> VariantResolver<'a> {
    pub fn new(catalog: &'a AgvCatalog, lookup: Option<&'a dyn ChromosomeLookup>) -> Self {
        Self { catalog, lookup }
    }

    pub fn resolve(&self, query: &VariantQuery) -> Resolution {
        match query {
            VariantQuery::Coordinates { chromosome, position } => {
                match self.catalog.by_position(*chromosome, *position) {
                    Some(record) => {
                        info!("{} is an AGV ({})", query, record.rsid);
                        Resolution::Agv { record: record.clone() }
                    }
                    None => {
                        info!("{} is not in the AGV catalog", query);
                        Resolution::Coordinates {
                            chromosome: *chromosome,
                            position: *position,
                        }
                    }
                }
            }
            VariantQuery::RsId { rsid } => match self.catalog.by_rsid(rsid) {
                Some(record) => {
                    info!("{} is an AGV at {}:{}", rsid, record.chromosome, record.position);
                    Resolution::Agv { record: record.clone() }
                }
                None => {
                    info!("{} is not in the AGV catalog, looking up its chromosome", rsid);
                    Resolution::RsId {
                        rsid: rsid.clone(),
                        chromosome: self.lookup_chromosome(rsid),
                    }
                }
            },
        }
    }

    fn lookup_chromosome(&self, rsid: &str) -> ChromosomeStatus {
        let Some(lookup) = self.lookup else {
            warn!("No rsID -> chromosome lookup configured");
            return ChromosomeStatus::LookupFailed {
                message: "no rsID -> chromosome lookup configured".to_string(),
            };
        };

        match lookup.chromosome_for(rsid) {
            Ok(Some(chromosome)) => ChromosomeStatus::Resolved { chromosome },
            Ok(None) => {
                info!("{} has no chromosome entry", rsid);
                ChromosomeStatus::Missing
            }
            Err(e) => {
                warn!("Error loading rsID to chromosome lookup: {}", e);
                ChromosomeStatus::LookupFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::MemoryTransport;
    use crate::parsers::gzip_bytes;

    fn catalog() -> AgvCatalog {
        AgvCatalog::new(vec![
            AgvRecord {
                chromosome: Chromosome::Autosome(11),
                position: 63290453,
                rsid: "rs1000".to_string(),
                ref_allele: "C".to_string(),
                alt_allele: "T".to_string(),
            },
            AgvRecord {
                chromosome: Chromosome::Autosome(11),
                position: 63290453,
                rsid: "rs1000_dup".to_string(),
                ref_allele: "C".to_string(),
                alt_allele: "G".to_string(),
            },
            AgvRecord {
                chromosome: Chromosome::X,
                position: 1500321,
                rsid: "rs2000".to_string(),
                ref_allele: "G".to_string(),
                alt_allele: "A".to_string(),
            },
        ])
    }

    struct FixedLookup(Result<Option<Chromosome>>);

    impl ChromosomeLookup for FixedLookup {
        fn chromosome_for(&self, _rsid: &str) -> Result<Option<Chromosome>> {
            match &self.0 {
                Ok(value) => Ok(*value),
                Err(e) => Err(AgvError::Fetch {
                    url: "lookup".to_string(),
                    status: None,
                    message: e.to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_prefix_normalization_is_equivalent() {
        let a = VariantQuery::from_inputs(Some("chr11"), Some("63290453"), None).unwrap();
        let b = VariantQuery::from_inputs(Some("11"), Some("63290453"), None).unwrap();
        let c = VariantQuery::from_inputs(Some("CHR11"), Some(" 63290453 "), Some("  ")).unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_both_or_neither_rejected() {
        let cases: [(Option<&str>, Option<&str>, Option<&str>); 6] = [
            (Some("11"), Some("100"), Some("rs1")),
            (None, None, None),
            (Some(""), Some(""), Some("")),
            (Some("11"), None, Some("rs1")),
            (None, Some("100"), Some("rs1")),
            (Some("11"), None, None),
        ];

        for (chromosome, position, rsid) in cases {
            let result = VariantQuery::from_inputs(chromosome, position, rsid);
            assert!(
                matches!(result, Err(AgvError::InvalidInput)),
                "{:?} {:?} {:?} should be rejected",
                chromosome,
                position,
                rsid
            );
        }
    }

    #[test]
    fn test_invalid_chromosome_and_position() {
        assert!(matches!(
            VariantQuery::from_inputs(Some("chr23"), Some("100"), None),
            Err(AgvError::InvalidChromosome(token)) if token == "23"
        ));
        assert!(matches!(
            VariantQuery::from_inputs(Some("11"), Some("0"), None),
            Err(AgvError::InvalidPosition(_))
        ));
        assert!(matches!(
            VariantQuery::from_inputs(Some("11"), Some("-5"), None),
            Err(AgvError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_query_display() {
        let query = VariantQuery::from_inputs(Some("chrX"), Some("42"), None).unwrap();
        assert_eq!(query.to_string(), "X:42");

        let query = VariantQuery::from_inputs(None, None, Some("rs7")).unwrap();
        assert_eq!(query.to_string(), "rs7");
        assert_eq!(query.rsid(), Some("rs7"));
    }

    #[test]
    fn test_resolve_agv_by_coordinates_first_row_wins() {
        let catalog = catalog();
        let resolver = VariantResolver::new(&catalog, None);
        let query = VariantQuery::Coordinates {
            chromosome: Chromosome::Autosome(11),
            position: 63290453,
        };

        let resolution = resolver.resolve(&query);
        assert!(resolution.is_agv());
        assert_eq!(resolution.rsid(), Some("rs1000"));
        assert_eq!(resolution.agv().unwrap().alt_allele, "T");
    }

    #[test]
    fn test_empty_catalog_resolves_nothing() {
        assert!(!catalog().is_empty());
        let empty = AgvCatalog::new(Vec::new());
        assert!(empty.is_empty());

        let resolver = VariantResolver::new(&empty, None);
        let query = VariantQuery::Coordinates {
            chromosome: Chromosome::Autosome(11),
            position: 63290453,
        };
        assert!(!resolver.resolve(&query).is_agv());
    }

    #[test]
    fn test_resolve_unknown_coordinates_verbatim() {
        let catalog = catalog();
        let resolver = VariantResolver::new(&catalog, None);
        let query = VariantQuery::Coordinates {
            chromosome: Chromosome::Autosome(3),
            position: 12345,
        };

        let resolution = resolver.resolve(&query);
        assert!(!resolution.is_agv());
        assert_eq!(resolution.chromosome(), Some(Chromosome::Autosome(3)));
        assert_eq!(resolution.position(), Some(12345));
        assert_eq!(resolution.rsid(), None);
    }

    #[test]
    fn test_resolve_agv_by_rsid() {
        let catalog = catalog();
        let resolver = VariantResolver::new(&catalog, None);
        let resolution = resolver.resolve(&VariantQuery::RsId { rsid: "rs2000".to_string() });

        assert!(resolution.is_agv());
        assert_eq!(resolution.chromosome(), Some(Chromosome::X));
        assert_eq!(resolution.position(), Some(1500321));
    }

    #[test]
    fn test_rsid_lookup_outcomes_are_distinct() {
        let catalog = catalog();
        let query = VariantQuery::RsId { rsid: "rs9".to_string() };

        let found = FixedLookup(Ok(Some(Chromosome::Autosome(7))));
        let resolution = VariantResolver::new(&catalog, Some(&found)).resolve(&query);
        assert!(!resolution.is_agv());
        assert_eq!(resolution.chromosome(), Some(Chromosome::Autosome(7)));

        let missing = FixedLookup(Ok(None));
        let resolution = VariantResolver::new(&catalog, Some(&missing)).resolve(&query);
        assert!(matches!(
            resolution,
            Resolution::RsId { chromosome: ChromosomeStatus::Missing, .. }
        ));
        assert_eq!(resolution.chromosome(), None);

        let failed = FixedLookup(Err(AgvError::InvalidInput));
        let resolution = VariantResolver::new(&catalog, Some(&failed)).resolve(&query);
        assert!(matches!(
            resolution,
            Resolution::RsId { chromosome: ChromosomeStatus::LookupFailed { .. }, .. }
        ));

        let resolution = VariantResolver::new(&catalog, None).resolve(&query);
        assert!(matches!(
            resolution,
            Resolution::RsId { chromosome: ChromosomeStatus::LookupFailed { .. }, .. }
        ));
    }

    #[test]
    fn test_remote_lookup_scans_table() {
        let mut transport = MemoryTransport::default();
        transport.payloads.insert(
            "https://example.org/rsid_chr.tsv.gz".to_string(),
            gzip_bytes("rs1\t1\nrs9\tchr7\nrs10\tX\n"),
        );
        let lookup = RemoteChromosomeLookup::new("https://example.org/rsid_chr.tsv.gz", Arc::new(transport));

        assert_eq!(lookup.chromosome_for("rs9").unwrap(), Some(Chromosome::Autosome(7)));
        assert_eq!(lookup.chromosome_for("rs10").unwrap(), Some(Chromosome::X));
        assert_eq!(lookup.chromosome_for("rs404").unwrap(), None);
    }

    #[test]
    fn test_remote_lookup_transport_failure() {
        let lookup = RemoteChromosomeLookup::new(
            "https://example.org/missing.tsv.gz",
            Arc::new(MemoryTransport::default()),
        );

        assert!(matches!(lookup.chromosome_for("rs1"), Err(AgvError::Fetch { .. })));
    }
}
