//! Listing metadata for objects stored in the bucket.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Metadata for one stored object as reported by the bucket listing.
///
/// Holds no content bytes; the backend owns the payload and this gateway
/// keeps no copy after a response is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    /// Object key (`<epoch-millis>_<original-filename>` for keys this
    /// gateway wrote; anything the bucket holds otherwise).
    pub key: String,

    /// Size in bytes.
    pub size: i64,

    /// When the object was last written.
    pub last_modified: DateTime<Utc>,
}

/// One row of the `GET /files` response: listing metadata plus a signed
/// download URL, generated fresh per request.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub key: String,
    pub size: i64,
    #[serde(rename = "lastModified", serialize_with = "iso8601_millis")]
    pub last_modified: DateTime<Utc>,
    pub url: String,
}

/// Millisecond-precision ISO-8601 with a `Z` suffix.
fn iso8601_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
