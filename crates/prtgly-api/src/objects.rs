// PRTG object property endpoints

use tracing::debug;

use crate::client::PrtgClient;
use crate::error::Error;

impl PrtgClient {
    /// Set one property on one object.
    ///
    /// `GET /api/setobjectproperty.htm?id={id}&name={name}&value={value}`
    ///
    /// PRTG answers with a small HTML page; only the status code matters.
    pub async fn set_object_property(&self, id: u64, name: &str, value: &str) -> Result<(), Error> {
        let id = id.to_string();
        let url = self.api_url(
            "setobjectproperty.htm",
            &[("id", id.as_str()), ("name", name), ("value", value)],
        )?;
        debug!(id, name, "setting object property");
        self.get_text(url).await?;
        Ok(())
    }
}
