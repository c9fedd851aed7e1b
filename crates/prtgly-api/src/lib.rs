// prtgly-api: Async Rust client for the PRTG HTTP API

pub mod client;
pub mod error;
pub mod models;
pub mod objects;
pub mod system;
pub mod table;
pub mod transport;

pub use client::{Credentials, PrtgClient};
pub use error::Error;
pub use models::{StatusPayload, TableRow};
pub use transport::{TlsMode, TransportConfig};
