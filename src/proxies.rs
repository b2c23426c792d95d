// ==============================================================================
// proxies.rs - LD Proxy Lookup
// ==============================================================================
// Description: Finds AGVs in linkage disequilibrium with a variant of interest
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

use tracing::info;

use crate::error::Result;
use crate::fetcher::TableSource;
use crate::models::{Chromosome, LdRecord};
use crate::parsers::{LdFilter, LdTableReader};
use crate::resolver::VariantQuery;

/// Filters a chromosome's LD table and ranks the matches
pub struct LdProxyFinder<'a> {
    source: &'a dyn TableSource,
}

impl<'a> LdProxyFinder<'a> {
    pub fn new(source: &'a dyn TableSource) -> Self {
        Self { source }
    }

    /// Filter for a query: rsID equality when an rsID was supplied, else coordinates
    pub fn filter_for(query: &VariantQuery) -> LdFilter {
        match query {
            VariantQuery::RsId { rsid } => LdFilter::RsId(rsid.clone()),
            VariantQuery::Coordinates { chromosome, position } => LdFilter::Position {
                chromosome: *chromosome,
                position: *position,
            },
        }
    }

    /// LD proxies on `chromosome`, strongest r² first
    ///
    /// An empty list is a normal outcome, not an error.
    pub fn find(&self, chromosome: Chromosome, filter: &LdFilter) -> Result<Vec<LdRecord>> {
        let reader = self.source.open(chromosome)?;
        let mut records = LdTableReader::filter(reader, filter)?;
        rank_by_r2(&mut records);

        info!("Found {} LD proxies on chromosome {}", records.len(), chromosome);
        Ok(records)
    }
}

/// Stable sort, descending by each row's strongest r²
pub fn rank_by_r2(records: &mut [LdRecord]) {
    records.sort_by(|a, b| b.max_r2().total_cmp(&a.max_r2()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgvError;
    use crate::fetcher::Dataset;
    use std::collections::HashMap;
    use std::io::{BufRead, Cursor};

    const HEADER: &str = "chr\tLDV_pos\tLDV_rsID\tLDV_ref\tLDV_alt\tAGV_pos\tAGV_rsID\tAGV_ref\tAGV_alt\tpopulations\tr2\tD'\tcorr\n";

    struct StaticSource(HashMap<Chromosome, String>);

    impl TableSource for StaticSource {
        fn dataset(&self) -> Dataset {
            Dataset::LdTable
        }

        fn open(&self, chromosome: Chromosome) -> Result<Box<dyn BufRead + Send>> {
            let text = self.0.get(&chromosome).cloned().ok_or_else(|| AgvError::Mapping {
                dataset: self.dataset().to_string(),
                chromosome: chromosome.to_string(),
            })?;
            Ok(Box::new(Cursor::new(text.into_bytes())))
        }
    }

    fn source(rows: &str) -> StaticSource {
        let mut tables = HashMap::new();
        tables.insert(Chromosome::Autosome(11), format!("{}{}", HEADER, rows));
        StaticSource(tables)
    }

    #[test]
    fn test_results_sorted_by_descending_r2() {
        let source = source(
            "11\t100\trs1\tA\tG\t200\trs20\tC\tT\tAFR\t0.3\t0.9\t0.5\n\
             11\t100\trs1\tA\tG\t300\trs30\tC\tT\tAFR,EUR\t0.2,0.95\t0.9,0.9\t0.4,0.97\n\
             11\t100\trs1\tA\tG\t400\trs40\tC\tT\tEUR\t0.6\t0.9\t0.77\n\
             11\t101\trs2\tA\tG\t500\trs50\tC\tT\tEUR\t0.99\t0.9\t0.99\n",
        );
        let finder = LdProxyFinder::new(&source);
        let query = VariantQuery::RsId { rsid: "rs1".to_string() };

        let records = finder
            .find(Chromosome::Autosome(11), &LdProxyFinder::filter_for(&query))
            .unwrap();

        let order: Vec<&str> = records.iter().map(|r| r.agv_rsid.as_str()).collect();
        assert_eq!(order, vec!["rs30", "rs40", "rs20"]);
        for pair in records.windows(2) {
            assert!(pair[0].max_r2() >= pair[1].max_r2());
        }
    }

    #[test]
    fn test_ties_keep_file_order() {
        let source = source(
            "11\t100\trs1\tA\tG\t200\trs20\tC\tT\tAFR\t0.5\t0.9\t0.7\n\
             11\t100\trs1\tA\tG\t300\trs30\tC\tT\tAFR\t0.5\t0.9\t0.7\n",
        );
        let filter = LdFilter::Position { chromosome: Chromosome::Autosome(11), position: 100 };

        let records = LdProxyFinder::new(&source).find(Chromosome::Autosome(11), &filter).unwrap();
        assert_eq!(records[0].agv_rsid, "rs20");
        assert_eq!(records[1].agv_rsid, "rs30");
    }

    #[test]
    fn test_empty_table_is_empty_result() {
        let source = source("");
        let records = LdProxyFinder::new(&source)
            .find(Chromosome::Autosome(11), &LdFilter::RsId("rs1".to_string()))
            .unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn test_filter_for_query() {
        let query = VariantQuery::Coordinates { chromosome: Chromosome::X, position: 5 };
        assert_eq!(
            LdProxyFinder::filter_for(&query),
            LdFilter::Position { chromosome: Chromosome::X, position: 5 }
        );
    }
}
