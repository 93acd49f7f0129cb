//! Gzip-wrapped JSON codec

use super::{Fields, MetaCodec, TinyMeta};
use crate::error::{Error, Result};
use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

/// [`TinyMeta`] JSON compressed with gzip
#[derive(Debug, Clone, Copy, Default)]
pub struct TinyMetaGzip;

impl MetaCodec for TinyMetaGzip {
    fn name(&self) -> &'static str {
        "tinymetagzip"
    }

    fn encode(&self, fields: &Fields) -> Result<Vec<u8>> {
        let json = TinyMeta.encode(fields)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(Error::InvalidCompressedStream)?;
        encoder.finish().map_err(Error::InvalidCompressedStream)
    }

    fn decode(&self, data: &[u8]) -> Result<Fields> {
        // All members are read; bytes after the last one must be another member
        let mut json = Vec::new();
        MultiGzDecoder::new(data)
            .read_to_end(&mut json)
            .map_err(Error::InvalidCompressedStream)?;
        TinyMeta.decode(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_matches_plain_codec() {
        let many: Vec<(String, String)> = (0..200)
            .map(|i| (format!("key{i:03}"), format!("value {i}")))
            .collect();
        let many: Vec<(&str, &str)> = many.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        let cases = [
            fields(&[("artist", "Compressed Artist"), ("album", "B")]),
            fields(&[("k", "v")]),
            fields(&[("quote", "say \"hi\"\n\t"), ("unicode", "caf\u{e9} \u{1F600}")]),
            fields(&many),
        ];
        for original in &cases {
            let encoded = TinyMetaGzip.encode(original).unwrap();
            assert_eq!(&encoded[..2], &[0x1F, 0x8B], "gzip magic");

            let plain = TinyMeta
                .decode(&TinyMeta.encode(original).unwrap())
                .unwrap();
            assert_eq!(&plain, original);
            assert_eq!(TinyMetaGzip.decode(&encoded).unwrap(), plain);
        }
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        let mut data = gzip(br#"{"k":"v"}"#);
        data.extend_from_slice(b"JUNKJUNK");

        assert!(matches!(
            TinyMetaGzip.decode(&data),
            Err(Error::InvalidCompressedStream(_))
        ));
    }

    #[test]
    fn test_decodes_every_member() {
        let mut data = gzip(br#"{"k":"#);
        data.extend(gzip(br#""v"}"#));

        assert_eq!(TinyMetaGzip.decode(&data).unwrap(), fields(&[("k", "v")]));
    }

    #[test]
    fn test_rejects_uncompressed_input() {
        assert!(matches!(
            TinyMetaGzip.decode(br#"{"k":"v"}"#),
            Err(Error::InvalidCompressedStream(_))
        ));
    }

    #[test]
    fn test_json_failure_is_distinct() {
        let compressed = gzip(b"not json");

        assert!(matches!(
            TinyMetaGzip.decode(&compressed),
            Err(Error::InvalidJson(_))
        ));
    }
}
