// ── PRTG controller ──
//
// Production `RemoteClient`: translates engine requests into PRTG API
// calls and API payloads into domain entities.

use prtgly_api::{Credentials, PrtgClient, TlsMode, TransportConfig};
use tracing::{debug, info};

use crate::changeset::PropertyChange;
use crate::config::{AuthCredentials, ControllerConfig, TlsVerification};
use crate::convert::{entity_from_row, status_from_payload};
use crate::error::CoreError;
use crate::model::{ContentType, Entity, PropertySchema};
use crate::remote::{RemoteClient, StatusReport};

/// Connection to one PRTG server.
pub struct Controller {
    client: PrtgClient,
    schema: PropertySchema,
}

impl Controller {
    /// Build the HTTP client. No request is made until the first call.
    pub fn new(config: &ControllerConfig, schema: PropertySchema) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
        };
        let credentials = match &config.auth {
            AuthCredentials::Password { username, password } => Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            },
            AuthCredentials::Passhash { username, passhash } => Credentials::Passhash {
                username: username.clone(),
                passhash: passhash.clone(),
            },
        };

        let client = PrtgClient::new(config.url.clone(), credentials, &transport)?;
        debug!(url = %config.url, "controller ready");
        Ok(Self::with_client(client, schema))
    }

    /// Wrap an existing API client.
    pub fn with_client(client: PrtgClient, schema: PropertySchema) -> Self {
        Self { client, schema }
    }

    pub fn url(&self) -> &url::Url {
        self.client.base_url()
    }
}

impl RemoteClient for Controller {
    async fn fetch_content(&self, content_type: ContentType) -> Result<Vec<Entity>, CoreError> {
        let rows = self
            .client
            .table(content_type.table_name(), content_type.table_columns())
            .await
            .map_err(|e| CoreError::not_found_or(e, "table", content_type.table_name()))?;
        info!(content = content_type.table_name(), rows = rows.len(), "table fetched");
        rows.iter()
            .map(|row| entity_from_row(row, content_type, &self.schema))
            .collect()
    }

    async fn status(&self) -> Result<StatusReport, CoreError> {
        let payload = self
            .client
            .status()
            .await
            .map_err(|e| CoreError::not_found_or(e, "endpoint", "getstatus.htm"))?;
        Ok(status_from_payload(payload))
    }

    async fn set_property(&self, change: &PropertyChange) -> Result<(), CoreError> {
        self.client
            .set_object_property(change.object_id, &change.property_name, &change.property_value)
            .await
            .map_err(|e| CoreError::RemoteApply {
                object_id: change.object_id,
                property: change.property_name.clone(),
                message: CoreError::from(e).to_string(),
            })
    }
}
