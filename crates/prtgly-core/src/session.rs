// ── Run orchestration ──
//
// One `Session` per process invocation. It owns the entity cache and
// walks the run through its states:
//
//   Loaded → Matched → Reconciled → Previewed | Applied | PartiallyApplied | Aborted
//
// Nothing persists across runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tracing::{debug, error, info, warn};

use crate::changeset::{ChangeSet, ChangeSetBuilder, PropertyChange, Query};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::import;
use crate::model::ContentSelector;
use crate::remote::{RemoteClient, StatusReport};
use crate::rules::Rule;
use crate::store::EntityStore;

/// Where the run's entities came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched from the PRTG API.
    Remote,
    /// Read from a bulk import file; preview only.
    Import(PathBuf),
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Loaded,
    Matched,
    Reconciled,
    Previewed,
    Applied,
    PartiallyApplied,
    Aborted,
}

/// A change the remote side rejected.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyFailure {
    pub change: PropertyChange,
    pub message: String,
}

/// Outcome of sending a change set.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Every change that was sent, in order.
    pub attempted: Vec<PropertyChange>,
    pub failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn succeeded(&self) -> usize {
        self.attempted.len() - self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Entity cache plus the state of one run.
pub struct Session {
    store: EntityStore,
    config: EngineConfig,
    source: Source,
    state: RunState,
}

impl Session {
    pub fn new(config: EngineConfig, source: Source) -> Self {
        Self {
            store: EntityStore::new(),
            config,
            source,
            state: RunState::Loaded,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the selected content from the remote side.
    ///
    /// With `with_ancestors`, every level above the selection is fetched
    /// first so parents resolve during reconciliation.
    pub async fn load_remote<R: RemoteClient>(
        &mut self,
        remote: &R,
        selector: ContentSelector,
        with_ancestors: bool,
    ) -> Result<usize, CoreError> {
        let content = if with_ancestors {
            selector.required_content()
        } else {
            selector.content_types()
        };

        let mut total = 0;
        for content_type in content {
            let query = Query::Table {
                content: *content_type,
            };
            debug!(%query, "fetching");
            let entities = remote.fetch_content(*content_type).await?;
            total += self.store.put_all(entities, false);
        }
        self.state = RunState::Loaded;
        info!(selection = %selector, entities = total, "content loaded");
        Ok(total)
    }

    /// Load entities from the session's import file.
    pub fn load_import(&mut self) -> Result<usize, CoreError> {
        let Source::Import(path) = &self.source else {
            return Err(CoreError::Config {
                message: "no import file configured for this run".into(),
            });
        };
        let path: &Path = path;
        let count = import::import_file(path, &mut self.store, &self.config)?;
        self.state = RunState::Loaded;
        Ok(count)
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Match and reconcile `rules` over the selection.
    ///
    /// Matched entities are updated in the store and flagged dirty.
    pub fn reconcile(&mut self, selector: ContentSelector, rules: &[Rule]) -> ChangeSet {
        self.state = RunState::Matched;
        let change_set = ChangeSetBuilder::new(&mut self.store, &self.config).build(selector, rules);
        self.state = RunState::Reconciled;
        change_set
    }

    /// Reconcile without touching the remote side.
    pub fn preview(&mut self, selector: ContentSelector, rules: &[Rule]) -> ChangeSet {
        let change_set = self.reconcile(selector, rules);
        self.state = RunState::Previewed;
        change_set
    }

    /// Server status, passed through from the remote side.
    pub async fn status<R: RemoteClient>(&self, remote: &R) -> Result<StatusReport, CoreError> {
        if matches!(self.source, Source::Import(_)) {
            return Err(CoreError::Config {
                message: "server status needs a live connection, not an import file".into(),
            });
        }
        debug!(query = %Query::Status, "fetching");
        remote.status().await
    }

    // ── Apply ────────────────────────────────────────────────────────

    /// Send every query in `change_set`, one at a time.
    ///
    /// Failures are logged with object id and property. By default the
    /// run continues; with `abort_on_error` the first failure ends it and
    /// is returned. Entities whose update failed stay dirty in the store.
    pub async fn apply<R: RemoteClient>(
        &mut self,
        remote: &R,
        change_set: &ChangeSet,
    ) -> Result<ApplyReport, CoreError> {
        if matches!(self.source, Source::Import(_)) {
            return Err(CoreError::ApplyFromImport);
        }

        let started_at = Utc::now();
        let mut attempted = Vec::with_capacity(change_set.len());
        let mut failures = Vec::new();

        for change in change_set.iter().filter_map(Query::as_property_change) {
            attempted.push(change.clone());
            match remote.set_property(change).await {
                Ok(()) => {
                    info!(
                        object_id = change.object_id,
                        property = change.property_name.as_str(),
                        "property applied"
                    );
                }
                Err(err) => {
                    error!(
                        object_id = change.object_id,
                        property = change.property_name.as_str(),
                        error = %err,
                        "failed applying rules"
                    );
                    if self.config.abort_on_error {
                        error!("aborted run");
                        self.state = RunState::Aborted;
                        return Err(into_apply_error(err, change));
                    }
                    failures.push(ApplyFailure {
                        change: change.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        self.state = if failures.is_empty() {
            RunState::Applied
        } else {
            warn!(failed = failures.len(), "change set partially applied");
            RunState::PartiallyApplied
        };

        Ok(ApplyReport {
            started_at,
            finished_at: Utc::now(),
            attempted,
            failures,
        })
    }
}

fn into_apply_error(err: CoreError, change: &PropertyChange) -> CoreError {
    match err {
        CoreError::RemoteApply { .. } => err,
        other => CoreError::RemoteApply {
            object_id: change.object_id,
            property: change.property_name.clone(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ContentType, Entity, ObjectId, PropertyValue};
    use crate::rules::parse_rules;

    /// In-memory PRTG: serves fixed tables and records property sets.
    #[derive(Default)]
    struct FakeRemote {
        tables: Vec<Entity>,
        failing: HashSet<ObjectId>,
        fetched: RefCell<Vec<ContentType>>,
        applied: RefCell<Vec<PropertyChange>>,
    }

    impl RemoteClient for FakeRemote {
        async fn fetch_content(&self, content_type: ContentType) -> Result<Vec<Entity>, CoreError> {
            self.fetched.borrow_mut().push(content_type);
            Ok(self
                .tables
                .iter()
                .filter(|e| e.content_type == content_type)
                .cloned()
                .collect())
        }

        async fn status(&self) -> Result<StatusReport, CoreError> {
            Ok(StatusReport::from([("Version".to_owned(), "23.1.82".to_owned())]))
        }

        async fn set_property(&self, change: &PropertyChange) -> Result<(), CoreError> {
            if self.failing.contains(&change.object_id) {
                return Err(CoreError::Api {
                    message: "HTTP 400".into(),
                    status: Some(400),
                });
            }
            self.applied.borrow_mut().push(change.clone());
            Ok(())
        }
    }

    fn tags(values: &[&str]) -> PropertyValue {
        PropertyValue::List(values.iter().map(|s| (*s).to_owned()).collect())
    }

    fn remote() -> FakeRemote {
        FakeRemote {
            tables: vec![
                Entity::new(1, ContentType::Group, "NET").with_property("tags", tags(&["core"])),
                Entity::new(2, ContentType::Device, "SW1")
                    .with_parent(1)
                    .with_property("tags", tags(&["edge"])),
                Entity::new(3, ContentType::Device, "SW2")
                    .with_parent(1)
                    .with_property("tags", tags(&[])),
            ],
            ..FakeRemote::default()
        }
    }

    fn rules() -> Vec<Rule> {
        parse_rules(
            "rules:\n  - { name: 'SW*', prop: tags, value: [core, mgmt], update: true }\n",
            "test",
        )
        .unwrap()
    }

    fn config(abort_on_error: bool) -> EngineConfig {
        EngineConfig {
            abort_on_error,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn load_fetches_ancestors_first() {
        let remote = remote();
        let mut session = Session::new(EngineConfig::default(), Source::Remote);
        let loaded = session
            .load_remote(&remote, ContentType::Device.into(), true)
            .await
            .unwrap();

        assert_eq!(loaded, 3);
        assert_eq!(
            *remote.fetched.borrow(),
            vec![ContentType::Group, ContentType::Device]
        );
        assert_eq!(session.state(), RunState::Loaded);
    }

    #[tokio::test]
    async fn preview_marks_dirty_without_remote_calls() {
        let remote = remote();
        let mut session = Session::new(EngineConfig::default(), Source::Remote);
        session
            .load_remote(&remote, ContentType::Device.into(), true)
            .await
            .unwrap();

        let cs = session.preview(ContentType::Device.into(), &rules());

        assert_eq!(
            cs.queries(),
            &[
                Query::set_property(2, "tags", "edge mgmt"),
                Query::set_property(3, "tags", "mgmt"),
            ]
        );
        assert_eq!(session.state(), RunState::Previewed);
        assert!(remote.applied.borrow().is_empty());
        assert_eq!(
            session
                .store()
                .get_changed_by_content_type(ContentType::Device)
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn apply_sends_every_change() {
        let remote = remote();
        let mut session = Session::new(EngineConfig::default(), Source::Remote);
        session
            .load_remote(&remote, ContentType::Device.into(), true)
            .await
            .unwrap();
        let cs = session.reconcile(ContentType::Device.into(), &rules());

        let report = session.apply(&remote, &cs).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.succeeded(), 2);
        assert_eq!(remote.applied.borrow().len(), 2);
        assert_eq!(session.state(), RunState::Applied);
    }

    #[tokio::test]
    async fn apply_continues_past_failures_by_default() {
        let mut remote = remote();
        remote.failing.insert(2);
        let mut session = Session::new(config(false), Source::Remote);
        session
            .load_remote(&remote, ContentType::Device.into(), true)
            .await
            .unwrap();
        let cs = session.reconcile(ContentType::Device.into(), &rules());

        let report = session.apply(&remote, &cs).await.unwrap();

        assert_eq!(report.attempted.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].change.object_id, 2);
        assert_eq!(*remote.applied.borrow(), vec![PropertyChange {
            object_id: 3,
            property_name: "tags".into(),
            property_value: "mgmt".into(),
        }]);
        assert_eq!(session.state(), RunState::PartiallyApplied);
        assert!(session.store().get_by_id(2).unwrap().dirty);
    }

    #[tokio::test]
    async fn apply_aborts_on_first_failure_when_configured() {
        let mut remote = remote();
        remote.failing.insert(2);
        let mut session = Session::new(config(true), Source::Remote);
        session
            .load_remote(&remote, ContentType::Device.into(), true)
            .await
            .unwrap();
        let cs = session.reconcile(ContentType::Device.into(), &rules());

        let err = session.apply(&remote, &cs).await.unwrap_err();

        assert!(
            matches!(err, CoreError::RemoteApply { object_id: 2, ref property, .. } if property == "tags"),
            "got {err:?}"
        );
        assert!(remote.applied.borrow().is_empty());
        assert_eq!(session.state(), RunState::Aborted);
    }

    #[tokio::test]
    async fn apply_from_import_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.csv");
        std::fs::write(&path, "type,objid,parentid,name,tags\nDevice,2,,SW1,edge\n").unwrap();

        let mut session = Session::new(EngineConfig::default(), Source::Import(path));
        assert_eq!(session.load_import().unwrap(), 1);
        let cs = session.preview(ContentType::Device.into(), &rules());
        assert_eq!(cs.len(), 1);

        let err = session.apply(&remote(), &cs).await.unwrap_err();
        assert!(matches!(err, CoreError::ApplyFromImport));
    }

    #[tokio::test]
    async fn status_comes_from_the_live_server() {
        let session = Session::new(EngineConfig::default(), Source::Remote);
        let status = session.status(&remote()).await.unwrap();
        assert_eq!(status["Version"], "23.1.82");
    }

    #[tokio::test]
    async fn status_is_unavailable_for_imports() {
        let session = Session::new(EngineConfig::default(), Source::Import("entities.csv".into()));
        let err = session.status(&remote()).await.unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }), "got {err:?}");
    }

    #[test]
    fn load_import_requires_import_source() {
        let mut session = Session::new(EngineConfig::default(), Source::Remote);
        assert!(matches!(session.load_import(), Err(CoreError::Config { .. })));
    }
}
