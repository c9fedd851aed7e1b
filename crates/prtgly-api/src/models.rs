// PRTG API response types
//
// Table and status payloads are loosely typed: the column set depends on
// the `columns` parameter and on the PRTG version, so rows stay as JSON
// maps and the domain layer picks out the fields it understands.

use serde::Deserialize;

/// One row of a `table.json` response (column name -> JSON value).
pub type TableRow = serde_json::Map<String, serde_json::Value>;

/// Decoded `getstatus.htm` payload (field name -> JSON value).
pub type StatusPayload = serde_json::Map<String, serde_json::Value>;

/// Envelope of `table.json`.
///
/// ```json
/// { "prtg-version": "23.1.82", "treesize": 2, "devices": [ {...}, {...} ] }
/// ```
///
/// The row array lives under a key named after the requested content.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    #[serde(rename = "prtg-version", default)]
    pub prtg_version: Option<String>,
    #[serde(default)]
    pub treesize: Option<u64>,
    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}
