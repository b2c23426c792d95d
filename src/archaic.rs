// ==============================================================================
// archaic.rs - Archaic Hominin Genotypes
// ==============================================================================
// Description: Pulls the four high-coverage archaic genomes out of the joined
//              genotype table
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Genomes (AADR Genetic_ID -> display name):
//   AltaiNeanderthal_snpAD.DG -> Altai        (Neanderthal)
//   Chagyrskaya_noUDG.SG      -> Chagyrskaya  (Neanderthal)
//   Denisova3_snpAD.DG        -> Denisovan    (Denisovan)
//   Vindija_snpAD.DG          -> Vindija      (Neanderthal)
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::JoinedGenotypeRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArchaicHominin {
    Altai,
    Chagyrskaya,
    Denisovan,
    Vindija,
}

impl ArchaicHominin {
    pub const ALL: [ArchaicHominin; 4] = [
        ArchaicHominin::Altai,
        ArchaicHominin::Chagyrskaya,
        ArchaicHominin::Denisovan,
        ArchaicHominin::Vindija,
    ];

    pub fn genetic_id(&self) -> &'static str {
        match self {
            ArchaicHominin::Altai => "AltaiNeanderthal_snpAD.DG",
            ArchaicHominin::Chagyrskaya => "Chagyrskaya_noUDG.SG",
            ArchaicHominin::Denisovan => "Denisova3_snpAD.DG",
            ArchaicHominin::Vindija => "Vindija_snpAD.DG",
        }
    }

    pub fn from_genetic_id(genetic_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.genetic_id() == genetic_id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArchaicHominin::Altai => "Altai",
            ArchaicHominin::Chagyrskaya => "Chagyrskaya",
            ArchaicHominin::Denisovan => "Denisovan",
            ArchaicHominin::Vindija => "Vindija",
        }
    }
}

impl fmt::Display for ArchaicHominin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Genotype per archaic genome; genomes absent from the matrix are omitted
pub type ArchaicGenotypes = BTreeMap<ArchaicHominin, String>;

/// Collect archaic genotypes (last occurrence wins on duplicate Genetic_IDs)
pub fn split_archaic(rows: &[JoinedGenotypeRow]) -> ArchaicGenotypes {
    rows.iter()
        .filter_map(|row| {
            ArchaicHominin::from_genetic_id(row.genetic_id())
                .map(|hominin| (hominin, row.genotype.genotype.clone()))
        })
        .collect()
}
