// ==============================================================================
// frequency.rs - Regional Allele Frequencies Through Time
// ==============================================================================
// Description: Alt allele frequency of an AGV per region and time bin
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   1. Keep population samples only: Location present and free of the
//      archaic/reference markers "Denisova", "Neanderthal", "REF"
//      (case-sensitive substring match)
//   2. Keep one sample per specimen, preferring Data_source "Shotgun.diploid";
//      among equally preferred samples the first in input order wins.
//      A sample without Specimen_ID is keyed by its Genetic_ID, so such
//      samples are never merged with each other
//   3. For each region (plus "Total") and time bin:
//        empty subset            -> blank cell
//        otherwise, over calls != "./.":
//        frequency = count('1') / (2 * non-missing calls)
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::models::{FrequencyCell, JoinedGenotypeRow, Region, TimeBin, TIME_BINS};

/// Location substrings marking archaic genomes and reference sequences
pub const EXCLUDED_LOCATION_MARKERS: [&str; 3] = ["Denisova", "Neanderthal", "REF"];

/// Preferred Data_source when a specimen was sequenced more than once
pub const SHOTGUN_DIPLOID: &str = "Shotgun.diploid";

/// Label of the all-regions row
pub const TOTAL_LABEL: &str = "Total";

/// True if the row may enter population frequency calculations
///
/// Rows without a Location (including unannotated samples) are excluded.
pub fn is_population_sample(row: &JoinedGenotypeRow) -> bool {
    match row.location() {
        Some(location) => !EXCLUDED_LOCATION_MARKERS
            .iter()
            .any(|marker| location.contains(marker)),
        None => false,
    }
}

fn is_shotgun_diploid(row: &JoinedGenotypeRow) -> bool {
    row.data_source() == Some(SHOTGUN_DIPLOID)
}

/// One row per specimen (Specimen_ID, or Genetic_ID when it is absent)
pub fn deduplicate_specimens<'r>(rows: &[&'r JoinedGenotypeRow]) -> Vec<&'r JoinedGenotypeRow> {
    let mut kept: Vec<&JoinedGenotypeRow> = Vec::with_capacity(rows.len());
    let mut slot_by_specimen: HashMap<&str, usize> = HashMap::new();

    for &row in rows {
        let specimen = row.specimen_id().unwrap_or_else(|| row.genetic_id());

        match slot_by_specimen.get(specimen) {
            None => {
                slot_by_specimen.insert(specimen, kept.len());
                kept.push(row);
            }
            Some(&slot) => {
                if is_shotgun_diploid(row) && !is_shotgun_diploid(kept[slot]) {
                    kept[slot] = row;
                }
            }
        }
    }

    debug!("Deduplicated {} samples to {} specimens", rows.len(), kept.len());
    kept
}

/// Frequency cell for a subset of samples
pub fn allele_frequency(subset: &[&JoinedGenotypeRow]) -> FrequencyCell {
    if subset.is_empty() {
        return FrequencyCell::Blank;
    }

    let called: Vec<&&JoinedGenotypeRow> = subset.iter().filter(|row| !row.genotype.is_missing()).collect();
    let alt_alleles: usize = called.iter().map(|row| row.genotype.alt_allele_count()).sum();
    let total_alleles = 2 * called.len();

    let frequency = if total_alleles > 0 {
        Some(alt_alleles as f64 / total_alleles as f64)
    } else {
        None
    };

    FrequencyCell::Computed {
        frequency,
        samples: called.len(),
    }
}

/// One region (or "Total") across all time bins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRow {
    pub region: String,
    /// One cell per entry of TIME_BINS, same order
    pub cells: Vec<FrequencyCell>,
}

/// Region x time-bin allele frequency summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    /// Exclude, deduplicate and bin the joined genotype rows
    pub fn compute(rows: &[JoinedGenotypeRow]) -> Self {
        let eligible: Vec<&JoinedGenotypeRow> = rows.iter().filter(|row| is_population_sample(row)).collect();
        let samples = deduplicate_specimens(&eligible);

        info!(
            "Computing allele frequencies from {} specimens ({} of {} samples eligible)",
            samples.len(),
            eligible.len(),
            rows.len()
        );

        let mut table_rows: Vec<FrequencyRow> = Region::SUMMARIZED
            .iter()
            .map(|region| FrequencyRow {
                region: region.to_string(),
                cells: Self::bin_cells(&samples, Some(region)),
            })
            .collect();

        table_rows.push(FrequencyRow {
            region: TOTAL_LABEL.to_string(),
            cells: Self::bin_cells(&samples, None),
        });

        Self { rows: table_rows }
    }

    fn bin_cells(samples: &[&JoinedGenotypeRow], region: Option<&Region>) -> Vec<FrequencyCell> {
        TIME_BINS
            .iter()
            .map(|bin| {
                let subset: Vec<&JoinedGenotypeRow> = samples
                    .iter()
                    .copied()
                    .filter(|row| region.map_or(true, |r| row.region() == Some(r)))
                    .filter(|row| in_bin(row, bin))
                    .collect();
                allele_frequency(&subset)
            })
            .collect()
    }

    pub fn row(&self, region: &str) -> Option<&FrequencyRow> {
        self.rows.iter().find(|row| row.region == region)
    }

    /// Cell by region label and time-bin identifier (e.g., "Europe", "5000")
    pub fn cell(&self, region: &str, bin_id: &str) -> Option<FrequencyCell> {
        let column = TIME_BINS.iter().position(|bin| bin.id == bin_id)?;
        self.row(region)?.cells.get(column).copied()
    }
}

fn in_bin(row: &JoinedGenotypeRow, bin: &TimeBin) -> bool {
    row.date_mean().map_or(false, |date| bin.contains(date))
}

impl fmt::Display for FrequencyTable {
    /// Tab-separated table with time-bin labels as the header
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region")?;
        for bin in TIME_BINS.iter() {
            write!(f, "\t{}", bin.label)?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{}", row.region)?;
            for cell in &row.cells {
                write!(f, "\t{}", cell)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenotypeRow, SampleAnnotation};

    struct Sample<'a> {
        id: &'a str,
        specimen: &'a str,
        gt: &'a str,
        region: &'a str,
        date: f64,
        source: &'a str,
        location: &'a str,
    }

    fn joined(s: Sample) -> JoinedGenotypeRow {
        JoinedGenotypeRow {
            genotype: GenotypeRow {
                genetic_id: s.id.to_string(),
                genotype: s.gt.to_string(),
            },
            annotation: Some(SampleAnnotation {
                genetic_id: s.id.to_string(),
                specimen_id: Some(s.specimen.to_string()),
                region: Some(Region::from(s.region.to_string())),
                date_mean: Some(s.date),
                data_source: Some(s.source.to_string()),
                location: Some(s.location.to_string()),
            }),
        }
    }

    fn europe(id: &str, gt: &str, date: f64) -> JoinedGenotypeRow {
        joined(Sample {
            id,
            specimen: id,
            gt,
            region: "Europe",
            date,
            source: "1240K",
            location: "Germany",
        })
    }

    #[test]
    fn test_frequency_with_missing_call() {
        let rows = [europe("A", "0/1", 0.0), europe("B", "./.", 0.0), europe("C", "1/1", 0.0)];
        let refs: Vec<&JoinedGenotypeRow> = rows.iter().collect();

        assert_eq!(
            allele_frequency(&refs),
            FrequencyCell::Computed { frequency: Some(0.75), samples: 2 }
        );
    }

    #[test]
    fn test_empty_subset_is_blank() {
        assert_eq!(allele_frequency(&[]), FrequencyCell::Blank);
    }

    #[test]
    fn test_all_missing_subset_has_no_frequency() {
        let rows = [europe("A", "./.", 0.0)];
        let refs: Vec<&JoinedGenotypeRow> = rows.iter().collect();

        let cell = allele_frequency(&refs);
        assert_eq!(cell, FrequencyCell::Computed { frequency: None, samples: 0 });
        assert!(!cell.is_blank());
    }

    #[test]
    fn test_archaic_and_reference_rows_excluded() {
        let denisovan = joined(Sample {
            id: "Denisova3_snpAD.DG",
            specimen: "Denisova3",
            gt: "1/1",
            region: "Europe",
            date: 0.0,
            source: SHOTGUN_DIPLOID,
            location: "Denisova Cave",
        });
        let reference = joined(Sample {
            id: "Href.REF",
            specimen: "Href",
            gt: "0/0",
            region: "Europe",
            date: 0.0,
            source: "REF",
            location: "REF",
        });
        let lowercase = joined(Sample {
            id: "L1",
            specimen: "L1",
            gt: "0/1",
            region: "Europe",
            date: 0.0,
            source: "1240K",
            location: "near denisova",
        });

        assert!(!is_population_sample(&denisovan));
        assert!(!is_population_sample(&reference));
        assert!(is_population_sample(&lowercase));
        assert!(is_population_sample(&europe("A", "0/1", 0.0)));

        let mut unannotated = europe("U", "0/1", 0.0);
        unannotated.annotation = None;
        assert!(!is_population_sample(&unannotated));
    }

    #[test]
    fn test_shotgun_diploid_preferred() {
        let capture = joined(Sample {
            id: "I1.AG",
            specimen: "I1",
            gt: "0/0",
            region: "Europe",
            date: 3500.0,
            source: "1240K",
            location: "Spain",
        });
        let shotgun = joined(Sample {
            id: "I1.SG",
            specimen: "I1",
            gt: "1/1",
            region: "Europe",
            date: 3500.0,
            source: SHOTGUN_DIPLOID,
            location: "Spain",
        });

        let rows = [&capture, &shotgun];
        let kept = deduplicate_specimens(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].genetic_id(), "I1.SG");

        let rows = [&shotgun, &capture];
        let kept = deduplicate_specimens(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].genetic_id(), "I1.SG");
    }

    #[test]
    fn test_equal_preference_keeps_first() {
        let first = europe("I2.A", "0/1", 100.0);
        let mut second = europe("I2.B", "1/1", 100.0);
        if let Some(annotation) = second.annotation.as_mut() {
            annotation.specimen_id = Some("I2.A".to_string());
        }

        let rows = [&first, &second];
        let kept = deduplicate_specimens(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].genetic_id(), "I2.A");
    }

    #[test]
    fn test_missing_specimen_ids_not_merged() {
        let mut first = europe("I3.A", "0/1", 100.0);
        let mut second = europe("I3.B", "1/1", 100.0);
        for row in [&mut first, &mut second] {
            if let Some(annotation) = row.annotation.as_mut() {
                annotation.specimen_id = None;
            }
        }

        let rows = [&first, &second];
        let kept = deduplicate_specimens(&rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].genetic_id(), "I3.A");
        assert_eq!(kept[1].genetic_id(), "I3.B");
    }

    #[test]
    fn test_table_shape_and_binning() {
        let rows = vec![
            europe("A", "0/1", 0.0),
            europe("B", "1/1", 0.0),
            europe("C", "0/0", 1000.0),
            europe("D", "0/1", 1001.0),
            europe("E", "0/1", 60_000.0),
            joined(Sample {
                id: "F",
                specimen: "F",
                gt: "1/1",
                region: "East Asia",
                date: 7500.0,
                source: "1240K",
                location: "China",
            }),
            joined(Sample {
                id: "G",
                specimen: "G",
                gt: "0/1",
                region: "Siberia",
                date: 7500.0,
                source: "1240K",
                location: "Russia",
            }),
        ];

        let table = FrequencyTable::compute(&rows);

        assert_eq!(table.rows.len(), 8);
        assert_eq!(table.rows[7].region, "Total");
        assert!(table.rows.iter().all(|row| row.cells.len() == 12));

        assert_eq!(
            table.cell("Europe", "Present"),
            Some(FrequencyCell::Computed { frequency: Some(0.75), samples: 2 })
        );
        assert_eq!(
            table.cell("Europe", "1000"),
            Some(FrequencyCell::Computed { frequency: Some(0.0), samples: 1 })
        );
        assert_eq!(
            table.cell("Europe", "2000"),
            Some(FrequencyCell::Computed { frequency: Some(0.5), samples: 1 })
        );
        assert_eq!(
            table.cell("East Asia", "10000"),
            Some(FrequencyCell::Computed { frequency: Some(1.0), samples: 1 })
        );

        // Region outside the summarized seven only counts toward Total
        assert_eq!(
            table.cell("Total", "10000"),
            Some(FrequencyCell::Computed { frequency: Some(0.75), samples: 2 })
        );
        assert_eq!(table.cell("Africa", "Present"), Some(FrequencyCell::Blank));

        // Samples older than 50 ka fall outside every bin
        let europe_row = table.row("Europe").unwrap();
        assert_eq!(europe_row.cells.iter().filter(|c| !c.is_blank()).count(), 3);
    }

    #[test]
    fn test_table_display() {
        let rows = vec![europe("A", "0/1", 0.0)];
        let rendered = FrequencyTable::compute(&rows).to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("Region\tPresent\t(0-1 ka]"));
        assert!(lines[4].starts_with("Europe\t0.5 (1)\t"));
        assert!(lines[8].starts_with("Total\t0.5 (1)"));
    }
}
