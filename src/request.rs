//! Field read/update specifications
//!
//! A specification is either `name` (read the field) or `name=value`
//! (set the field). Only the first `=` separates name and value.

use crate::codec::Fields;
use std::convert::Infallible;
use std::str::FromStr;

/// Fields to read and fields to update for one vendor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaRequest {
    /// Field names to extract, in request order
    pub read: Vec<String>,
    /// Field values to upsert
    pub update: Fields,
}

impl MetaRequest {
    /// Build a request from individual specifications; empty ones are skipped
    ///
    /// # Example
    ///
    /// ```
    /// use tinymeta_io::MetaRequest;
    ///
    /// let request = MetaRequest::parse(["artist", "title=Night", ""]);
    /// assert_eq!(request.read, vec!["artist"]);
    /// assert_eq!(request.update["title"], "Night");
    /// ```
    pub fn parse<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::default();
        for spec in specs {
            let spec = spec.as_ref();
            if spec.is_empty() {
                continue;
            }
            match spec.split_once('=') {
                Some((name, value)) => {
                    request.update.insert(name.to_string(), value.to_string());
                }
                None => request.read.push(spec.to_string()),
            }
        }
        request
    }

    /// True if there is nothing to read or update
    pub fn is_empty(&self) -> bool {
        self.read.is_empty() && self.update.is_empty()
    }
}

/// Parse a comma-separated list of specifications
impl FromStr for MetaRequest {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s.split(',')))
    }
}
