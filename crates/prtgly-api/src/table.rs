// PRTG table endpoint
//
// `table.json` lists objects of one content type (groups, devices, sensors)
// with the requested columns.

use tracing::debug;

use crate::client::PrtgClient;
use crate::error::Error;
use crate::models::{TableResponse, TableRow};

/// Upper bound on rows requested per table call.
const MAX_ROWS: &str = "50000";

impl PrtgClient {
    /// List all objects of one content type.
    ///
    /// `GET /api/table.json?content={content}&columns={columns}&count=50000`
    pub async fn table(&self, content: &str, columns: &[&str]) -> Result<Vec<TableRow>, Error> {
        let columns = columns.join(",");
        let url = self.api_url(
            "table.json",
            &[
                ("content", content),
                ("columns", columns.as_str()),
                ("count", MAX_ROWS),
            ],
        )?;
        debug!(content, "listing table");

        let mut response: TableResponse = self.get_json(url).await?;
        let rows = match response.content.remove(content) {
            Some(serde_json::Value::Array(rows)) => rows,
            Some(other) => {
                return Err(Error::Deserialization {
                    message: format!("expected array under '{content}'"),
                    body: other.to_string(),
                });
            }
            None => Vec::new(),
        };

        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}
