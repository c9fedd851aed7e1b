// PRTG HTTP client
//
// Wraps `reqwest::Client` with PRTG URL construction, credential query
// parameters, and status-code handling. Endpoint groups (tables, object
// properties, system status) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Credentials PRTG accepts on every API request.
///
/// PRTG authenticates each call individually via query parameters;
/// there is no session. A passhash is the account's numeric API hash
/// and is preferred over the plain password where available.
#[derive(Debug, Clone)]
pub enum Credentials {
    Password {
        username: String,
        password: SecretString,
    },
    Passhash {
        username: String,
        passhash: SecretString,
    },
}

impl Credentials {
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::Passhash { username, .. } => username,
        }
    }

    fn append_to(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        match self {
            Self::Password { username, password } => {
                pairs.append_pair("username", username);
                pairs.append_pair("password", password.expose_secret());
            }
            Self::Passhash { username, passhash } => {
                pairs.append_pair("username", username);
                pairs.append_pair("passhash", passhash.expose_secret());
            }
        }
    }
}

/// Raw HTTP client for a PRTG core server.
///
/// All methods return decoded payloads; HTTP-level failures are mapped
/// into [`Error`] before the caller sees them.
pub struct PrtgClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl PrtgClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the PRTG web server root (e.g. `https://prtg.example.com`).
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// The PRTG base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account name used for every request.
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}?{params}` without credentials.
    ///
    /// This is the form that is safe to print or log.
    pub fn api_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/api/{path}"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn authenticated(&self, mut url: Url) -> Url {
        self.credentials.append_to(&mut url);
        url
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and return the response body as text.
    pub(crate) async fn get_text(&self, url: Url) -> Result<String, Error> {
        debug!(path = url.path(), "GET");
        trace!(query = url.query().unwrap_or_default(), "request parameters");

        let resp = self
            .http
            .get(self.authenticated(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("PRTG rejected credentials for '{}'", self.username()),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    /// Send a GET request and decode the JSON response body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
