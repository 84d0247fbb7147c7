pub mod model;
pub mod distance;
pub mod store;
pub mod select;
pub mod export;
pub mod error;
pub mod profile;
pub mod parser;
pub mod map;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use crate::distance::Unit;
use crate::error::SessionError;
use crate::export::Format;
use crate::model::{GeoRecord, NeighborEntry, NeighborResult};
use crate::select::{CancelToken, Selector};
use crate::store::RecordStore;

/// One import/calculate/export workflow.
///
/// Owns the record store and the latest result. Importing replaces the
/// store and drops any earlier result, since results are never updated
/// incrementally.
pub struct Session {
    id: Uuid,
    source: Option<PathBuf>,
    store: Option<RecordStore>,
    result: Option<NeighborResult>,
    selector: Selector,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
        .field("id", &self.id)
        .field("records", &self.records().len())
        .field("calculated", &self.result.is_some())
        .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Unit::Miles)
    }
}

impl Session {
    pub fn new(unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: None,
            store: None,
            result: None,
            selector: Selector::new(unit),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn unit(&self) -> Unit {
        self.selector.unit()
    }

    /// Ingest a points table. On failure the session is left untouched.
    pub fn import(&mut self, path: &Path) -> Result<usize, SessionError> {
        let store = RecordStore::load(path)?;
        let count = store.len();
        info!(session = %self.id, path = %path.display(), records = count, "points imported");
        self.load(store, Some(path.to_path_buf()));
        Ok(count)
    }

    /// Replace the record store with an already validated one.
    pub fn load(&mut self, store: RecordStore, source: Option<PathBuf>) {
        self.store = Some(store);
        self.source = source;
        self.result = None;
    }

    pub fn calculate(&mut self, cancel: &CancelToken) -> Result<&NeighborResult, SessionError> {
        let store = self.store.as_ref().ok_or(SessionError::NothingImported)?;

        let started = Instant::now();
        debug!(session = %self.id, records = store.len(), threads = rayon::current_num_threads(), "selecting closest points");
        let result = self.selector.select(store.records(), cancel)?;
        info!(
            session = %self.id,
            subjects = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "closest points calculated"
        );

        let result = self.result.insert(result);
        Ok(&*result)
    }

    pub fn export(&self, path: &Path, format: Format) -> Result<usize, SessionError> {
        let result = self.result.as_ref().ok_or(SessionError::NothingCalculated)?;
        let rows = export::export(result, self.records(), path, format)?;
        Ok(rows)
    }

    /// Calculate, then export. Nothing is written if the calculation fails.
    pub fn run(&mut self, path: &Path, format: Format, cancel: &CancelToken) -> Result<usize, SessionError> {
        self.calculate(cancel)?;
        self.export(path, format)
    }

    pub fn neighbors_of(&self, index: usize) -> Option<&[NeighborEntry]> {
        self.result.as_ref()?.get(index)
    }

    pub fn records(&self) -> &[GeoRecord] {
        self.store.as_ref().map(RecordStore::records).unwrap_or(&[])
    }

    pub fn result(&self) -> Option<&NeighborResult> {
        self.result.as_ref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Channel;

    fn store() -> RecordStore {
        RecordStore::from_points(vec![
            (0.0, 0.0, Channel::Number(1)),
            (0.0, 1.0, Channel::Number(1)),
            (1.0, 0.0, Channel::Number(2)),
        ])
        .unwrap()
    }

    #[test]
    fn calculate_requires_import() {
        let mut session = Session::default();
        assert!(matches!(
            session.calculate(&CancelToken::new()),
            Err(SessionError::NothingImported)
        ));
    }

    #[test]
    fn export_requires_calculation() {
        let mut session = Session::default();
        session.load(store(), None);
        assert!(matches!(
            session.export(Path::new("unused.csv"), Format::Csv),
            Err(SessionError::NothingCalculated)
        ));
    }

    #[test]
    fn reload_invalidates_result() {
        let mut session = Session::default();
        session.load(store(), None);
        session.calculate(&CancelToken::new()).unwrap();
        assert!(session.neighbors_of(0).is_some());

        session.load(store(), None);
        assert!(session.result().is_none());
        assert!(session.neighbors_of(0).is_none());
    }

    #[test]
    fn failed_import_keeps_previous_store() {
        let mut session = Session::default();
        session.load(store(), Some(PathBuf::from("first.csv")));
        assert!(session.import(Path::new("does/not/exist.csv")).is_err());
        assert_eq!(session.records().len(), 3);
        assert_eq!(session.source(), Some(Path::new("first.csv")));
    }
}
