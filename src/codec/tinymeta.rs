//! Plain JSON codec

use super::{Fields, MetaCodec};
use crate::error::Result;

/// Compact JSON object of string keys to string values
#[derive(Debug, Clone, Copy, Default)]
pub struct TinyMeta;

impl MetaCodec for TinyMeta {
    fn name(&self) -> &'static str {
        "tinymeta"
    }

    fn encode(&self, fields: &Fields) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(fields)?)
    }

    fn decode(&self, data: &[u8]) -> Result<Fields> {
        Ok(serde_json::from_slice(data)?)
    }
}
