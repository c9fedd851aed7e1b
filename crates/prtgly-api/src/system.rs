// PRTG system endpoints

use tracing::debug;

use crate::client::PrtgClient;
use crate::error::Error;
use crate::models::StatusPayload;

impl PrtgClient {
    /// Get the PRTG core status (alarms, version, clock, ...).
    ///
    /// `GET /api/getstatus.htm?id=0`
    ///
    /// Returns loosely-typed JSON because the field set varies by
    /// PRTG version.
    pub async fn status(&self) -> Result<StatusPayload, Error> {
        let url = self.api_url("getstatus.htm", &[("id", "0")])?;
        debug!("fetching status");
        self.get_json(url).await
    }
}
