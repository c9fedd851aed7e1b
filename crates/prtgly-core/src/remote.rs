// ── Remote collaborator seam ──
//
// The session talks to PRTG only through this trait, so runs can be
// driven against an in-memory fake in tests. Calls are awaited one at a
// time; implementations need not be thread-safe.

use std::collections::BTreeMap;
use std::future::Future;

use crate::changeset::PropertyChange;
use crate::error::CoreError;
use crate::model::{ContentType, Entity};

/// Server status as display-ready key/value pairs.
pub type StatusReport = BTreeMap<String, String>;

/// Operations the engine needs from the monitoring platform.
pub trait RemoteClient {
    /// Every object of one content type.
    fn fetch_content(
        &self,
        content_type: ContentType,
    ) -> impl Future<Output = Result<Vec<Entity>, CoreError>>;

    /// Server status.
    fn status(&self) -> impl Future<Output = Result<StatusReport, CoreError>>;

    /// Push one property value.
    fn set_property(&self, change: &PropertyChange) -> impl Future<Output = Result<(), CoreError>>;
}
