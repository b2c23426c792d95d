// ==============================================================================
// parsers/mod.rs - Table parser modules
// ==============================================================================
// Description: Parsers for the AGV catalog, sample annotations, LD tables and
//              VCF-like genotype matrices, plus gzip-aware readers
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

pub mod annotation;
pub mod catalog;
pub mod genotype_matrix;
pub mod ld_table;

pub use annotation::AnnotationParser;
pub use catalog::CatalogParser;
pub use genotype_matrix::GenotypeExtractor;
pub use ld_table::{LdTableReader, LdFilter};

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Gzip magic number (BGZF files share it)
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Wrap a reader so gzip payloads are decompressed and plain text passes through
///
/// Uses a multi-member decoder so BGZF-compressed tables decode completely.
pub fn decompressing_reader<R>(mut reader: R) -> io::Result<Box<dyn BufRead + Send>>
where
    R: BufRead + Send + 'static,
{
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open a local table (.txt or .txt.gz)
pub fn open_table(path: impl AsRef<Path>) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;

    decompressing_reader(BufReader::new(file))
}

/// Gzip-compress text for test fixtures
#[cfg(test)]
pub(crate) fn gzip_bytes(text: &str) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_text_passes_through() {
        let mut reader = decompressing_reader(Cursor::new(b"a\tb\n".to_vec())).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "a\tb\n");
    }

    #[test]
    fn test_gzip_payload_is_decompressed() {
        let payload = gzip_bytes("#CHROM\tPOS\n1\t100\n");
        assert!(payload.starts_with(&GZIP_MAGIC));

        let mut reader = decompressing_reader(Cursor::new(payload)).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "#CHROM\tPOS\n1\t100\n");
    }

    #[test]
    fn test_multi_member_gzip() {
        let mut payload = gzip_bytes("first\n");
        payload.extend(gzip_bytes("second\n"));

        let reader = decompressing_reader(Cursor::new(payload)).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_open_table_gz_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&gzip_bytes("11\t63290453\trs1\tA\tG\n")).unwrap();
        file.flush().unwrap();

        let reader = open_table(file.path()).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["11\t63290453\trs1\tA\tG"]);
    }

    #[test]
    fn test_open_table_missing_file_names_path() {
        let err = match open_table("/nonexistent/AGVs_hg38.txt.gz") {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("AGVs_hg38.txt.gz"));
    }
}
