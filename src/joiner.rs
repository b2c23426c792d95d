// ==============================================================================
// joiner.rs - Sample Annotation Join
// ==============================================================================
// Description: Left-joins per-sample genotypes with AADR sample metadata
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

use std::collections::HashMap;
use tracing::info;

use crate::models::{GenotypeRow, JoinedGenotypeRow, SampleAnnotation};

/// Left join on Genetic_ID
///
/// Every genotype row is kept, in order. Unannotated rows carry `None`; a
/// Genetic_ID annotated more than once yields one row per annotation.
pub fn join_annotations(
    genotypes: Vec<GenotypeRow>,
    annotations: &[SampleAnnotation],
) -> Vec<JoinedGenotypeRow> {
    let mut index: HashMap<&str, Vec<&SampleAnnotation>> = HashMap::new();
    for annotation in annotations {
        index
            .entry(annotation.genetic_id.as_str())
            .or_default()
            .push(annotation);
    }

    let mut joined = Vec::with_capacity(genotypes.len());
    let mut unmatched = 0usize;

    for genotype in genotypes {
        match index.get(genotype.genetic_id.as_str()) {
            Some(matches) => {
                for annotation in matches {
                    joined.push(JoinedGenotypeRow {
                        genotype: genotype.clone(),
                        annotation: Some((*annotation).clone()),
                    });
                }
            }
            None => {
                unmatched += 1;
                joined.push(JoinedGenotypeRow {
                    genotype,
                    annotation: None,
                });
            }
        }
    }

    info!(
        "Joined {} genotype rows with annotations ({} unannotated)",
        joined.len(),
        unmatched
    );

    joined
}
