// ==============================================================================
// parsers/annotation.rs - AADR Sample Annotation Parser
// ==============================================================================
// Description: Parser for the Allen Ancient DNA Resource sample annotation table
// Author: Matt Barham
// Created: 2026-10-13
// Modified: 2026-10-13
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited with header, optionally gzip-compressed
// Example:
//   Genetic_ID    Specimen_ID    Date_mean    Location       Region    Data_source
//   I0001         I0001          5200         Spain_Basque   Europe    1240K
// Only the columns modeled by SampleAnnotation are read; others are ignored.
// ==============================================================================

use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::SampleAnnotation;

/// Parser for the sample annotation table
pub struct AnnotationParser;

impl AnnotationParser {
    /// Parse annotations from a local file (.txt or .txt.gz)
    pub fn parse_path(path: impl AsRef<Path>) -> Result<Vec<SampleAnnotation>> {
        let path = path.as_ref();
        info!("Loading sample annotations: {:?}", path);
        let reader = super::open_table(path)?;
        Self::parse(reader)
    }

    /// Parse annotation rows from any reader
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SampleAnnotation>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut annotations = Vec::new();
        for result in reader.deserialize() {
            let annotation: SampleAnnotation = result?;
            annotations.push(annotation);
        }

        info!("Loaded {} sample annotations", annotations.len());
        Ok(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    const ANNOTATIONS: &str = "\
Genetic_ID\tMaster_ID\tSpecimen_ID\tDate_mean\tLocation\tRegion\tData_source
I0001\tI0001\tI0001\t5200\tSpain_Basque\tEurope\t1240K
I0001.SG\tI0001\tI0001\t5200\tSpain_Basque\tEurope\tShotgun.diploid
HG00096.SG\tHG00096\tHG00096\t0\tGreat Britain\tEurope\tShotgun.diploid
Denisova3_snpAD.DG\tDenisova3\tDenisova3\t..\tDenisova Cave\t\tShotgun.diploid
";

    #[test]
    fn test_parse_annotations() {
        let annotations = AnnotationParser::parse(ANNOTATIONS.as_bytes()).unwrap();

        assert_eq!(annotations.len(), 4);

        let first = &annotations[0];
        assert_eq!(first.genetic_id, "I0001");
        assert_eq!(first.specimen_id.as_deref(), Some("I0001"));
        assert_eq!(first.region, Some(Region::Europe));
        assert_eq!(first.date_mean, Some(5200.0));
        assert_eq!(first.data_source.as_deref(), Some("1240K"));
        assert_eq!(first.location.as_deref(), Some("Spain_Basque"));

        assert_eq!(annotations[2].date_mean, Some(0.0));
    }

    #[test]
    fn test_empty_and_invalid_fields_are_absent() {
        let annotations = AnnotationParser::parse(ANNOTATIONS.as_bytes()).unwrap();
        let archaic = &annotations[3];

        assert_eq!(archaic.region, None);
        assert_eq!(archaic.date_mean, None);
        assert_eq!(archaic.location.as_deref(), Some("Denisova Cave"));
    }

    #[test]
    fn test_missing_optional_columns() {
        let text = "Genetic_ID\tRegion\nI0002\tAfrica\n";
        let annotations = AnnotationParser::parse(text.as_bytes()).unwrap();

        assert_eq!(annotations[0].region, Some(Region::Africa));
        assert_eq!(annotations[0].specimen_id, None);
        assert_eq!(annotations[0].date_mean, None);
    }
}
