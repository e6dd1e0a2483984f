//! Decoder for video sample exports.
//!
//! Accepts a JSON array of video rows or a CSV file with a header row,
//! optionally gzip-compressed.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

use crate::windows::VideoSample;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes raw export bytes into samples.
///
/// The format is sniffed: a leading `[` (after whitespace) means JSON,
/// anything else is read as CSV. Timestamps are kept as-is and validated
/// when scored.
///
/// # Errors
///
/// Returns an error for corrupt gzip data, malformed JSON/CSV, or view counts
/// that aren't non-negative integers.
pub fn parse_samples(bytes: &[u8]) -> Result<Vec<VideoSample>> {
    let decompressed;
    let bytes = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .context("failed to decompress gzip sample export")?;
        decompressed = out;
        decompressed.as_slice()
    } else {
        bytes
    };

    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    let samples = match first {
        None => Vec::new(),
        Some(b'[') => parse_json(bytes)?,
        Some(_) => parse_csv(bytes)?,
    };

    debug!(samples = samples.len(), "Parsed sample export");
    Ok(samples)
}

fn parse_json(bytes: &[u8]) -> Result<Vec<VideoSample>> {
    serde_json::from_slice(bytes).context("invalid JSON sample export")
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<VideoSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut samples = Vec::new();
    for (row, result) in rdr.deserialize().enumerate() {
        let sample: VideoSample =
            result.with_context(|| format!("invalid CSV sample export at row {}", row + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_parse_empty_bytes() {
        assert!(parse_samples(b"").unwrap().is_empty());
        assert!(parse_samples(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_json_rows() {
        let json = br#"[
            {"title": "ignored", "published_at": "2024-03-05T14:30:00Z", "views": 1200},
            {"published_at": "2024-03-06T09:00:00Z", "views": null}
        ]"#;
        let samples = parse_samples(json).unwrap();
        assert_eq!(
            samples,
            vec![
                VideoSample::new("2024-03-05T14:30:00Z", Some(1200)),
                VideoSample::new("2024-03-06T09:00:00Z", None),
            ]
        );
    }

    #[test]
    fn test_parse_csv_rows() {
        let csv = b"published_at,views\n2024-03-05T14:30:00Z,1200\n2024-03-06T09:00:00Z,\n";
        let samples = parse_samples(csv).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].view_count, Some(1200));
        assert_eq!(samples[1].view_count, None);
    }

    #[test]
    fn test_parse_gzip_json() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(br#"[{"publishedAt": "2024-03-05T14:30:00Z", "viewCount": "7"}]"#)
            .unwrap();
        let compressed = encoder.finish().unwrap();

        let samples = parse_samples(&compressed).unwrap();
        assert_eq!(samples, vec![VideoSample::new("2024-03-05T14:30:00Z", Some(7))]);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_samples(b"[{\"published_at\": 1").is_err());
    }

    #[test]
    fn test_parse_csv_bad_count() {
        let csv = b"published_at,views\n2024-03-05T14:30:00Z,lots\n";
        assert!(parse_samples(csv).is_err());
    }
}
