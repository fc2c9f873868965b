use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use domain::alert::entity::{AlertState, StateEvent};
use domain::alert::error::StateLogError;
use domain::alert::fingerprint::Fingerprint;
use domain::alert::query::StateEventQuery;
use ports::secondary::metrics_port::StateLogMetrics;
use ports::secondary::state_appender::StateAppender;
use ports::secondary::state_event_store::StateEventStore;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use uuid::Uuid;

/// redb table: key = UUIDv7 as `u128` (sorts by creation time),
/// value = JSON-serialized `StateEvent`.
const STATES_TABLE: TableDefinition<u128, &[u8]> = TableDefinition::new("alert_states");

/// Fingerprint index over `alert_states`: key = `(fingerprint, id)`.
const BY_FINGERPRINT_TABLE: TableDefinition<(u64, u128), ()> =
    TableDefinition::new("alert_states_by_fingerprint");

struct Inner {
    /// `None` once the appender is closed.
    db: Option<Database>,
    pending: Vec<StateEvent>,
}

/// Persistent alert state log backed by redb.
///
/// Appended rows are buffered in memory and committed in a single write
/// transaction on `flush`, or automatically once `buffer_capacity` rows are
/// pending. Rows are invisible to [`StateEventStore`] queries until then.
///
/// A batch whose commit fails is discarded, so at most `buffer_capacity`
/// rows are ever held in memory.
pub struct RedbStateAppender {
    inner: Mutex<Inner>,
    buffer_capacity: usize,
    metrics: Option<Arc<dyn StateLogMetrics>>,
}

impl RedbStateAppender {
    /// Open (or create) a redb database at `path`.
    pub fn open(path: &Path, buffer_capacity: usize) -> Result<Self, StateLogError> {
        let db = Database::create(path)
            .map_err(|e| StateLogError::StoreUnavailable(format!("redb open failed: {e}")))?;
        Self::with_database(db, buffer_capacity)
    }

    fn with_database(db: Database, buffer_capacity: usize) -> Result<Self, StateLogError> {
        // Ensure both tables exist so readers never see a missing table.
        let txn = db
            .begin_write()
            .map_err(|e| StateLogError::StoreUnavailable(format!("redb txn begin: {e}")))?;
        {
            txn.open_table(STATES_TABLE)
                .map_err(|e| StateLogError::StoreUnavailable(format!("redb table create: {e}")))?;
            txn.open_table(BY_FINGERPRINT_TABLE)
                .map_err(|e| StateLogError::StoreUnavailable(format!("redb index create: {e}")))?;
        }
        txn.commit()
            .map_err(|e| StateLogError::StoreUnavailable(format!("redb commit: {e}")))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                db: Some(db),
                pending: Vec::with_capacity(buffer_capacity.min(4096)),
            }),
            buffer_capacity: buffer_capacity.max(1),
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn StateLogMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Number of rows appended but not yet committed.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: StateEvent) {
        let mut inner = self.lock();
        if inner.db.is_none() {
            tracing::warn!(
                fingerprint = %event.fingerprint,
                state = event.state.as_str(),
                "state appender closed, dropping alert state"
            );
            self.record_dropped("closed", 1);
            return;
        }

        inner.pending.push(event);
        if inner.pending.len() >= self.buffer_capacity {
            // Failures are logged and counted by `flush_locked`.
            let _ = self.flush_locked(&mut inner);
        }
    }

    /// Commit every pending row in one write transaction.
    ///
    /// The pending batch is consumed either way: on failure its rows are
    /// dropped and counted under the `flush` reason.
    fn flush_locked(&self, inner: &mut Inner) -> Result<(), StateLogError> {
        let db = inner.db.as_ref().ok_or(StateLogError::Closed)?;
        if inner.pending.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        let mut batch = std::mem::take(&mut inner.pending);
        if let Err(e) = Self::commit(db, &batch) {
            tracing::error!(error = %e, rows = batch.len(), "state flush failed, dropping batch");
            self.record_dropped("flush", batch.len());
            return Err(e);
        }

        let rows = batch.len();
        batch.clear();
        inner.pending = batch;
        tracing::debug!(rows, "flushed alert states");

        if let Some(metrics) = &self.metrics {
            metrics.record_rows_flushed(rows as u64);
            metrics.observe_flush_duration(started.elapsed().as_secs_f64());
        }
        Ok(())
    }

    fn commit(db: &Database, batch: &[StateEvent]) -> Result<(), StateLogError> {
        let txn = db
            .begin_write()
            .map_err(|e| StateLogError::FlushFailed(format!("redb write txn: {e}")))?;
        {
            let mut states = txn
                .open_table(STATES_TABLE)
                .map_err(|e| StateLogError::FlushFailed(format!("redb write table: {e}")))?;
            let mut index = txn
                .open_table(BY_FINGERPRINT_TABLE)
                .map_err(|e| StateLogError::FlushFailed(format!("redb index table: {e}")))?;

            for event in batch {
                let id = event.id.as_u128();
                let value = serde_json::to_vec(event)
                    .map_err(|e| StateLogError::WriteFailed(format!("serialize: {e}")))?;
                states
                    .insert(id, value.as_slice())
                    .map_err(|e| StateLogError::FlushFailed(format!("redb insert: {e}")))?;
                index
                    .insert((event.fingerprint.as_u64(), id), ())
                    .map_err(|e| StateLogError::FlushFailed(format!("redb index insert: {e}")))?;
            }
        }
        txn.commit()
            .map_err(|e| StateLogError::FlushFailed(format!("redb commit: {e}")))
    }

    fn record_dropped(&self, reason: &str, rows: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.record_rows_dropped(reason, rows as u64);
        }
    }
}

impl StateAppender for RedbStateAppender {
    fn append(&self, fingerprint: Fingerprint, state: AlertState) {
        self.push(StateEvent::transition(Uuid::now_v7(), fingerprint, state));
    }

    fn append_inhibited(&self, fingerprint: Fingerprint, inhibited_by: &[String]) {
        self.push(StateEvent::inhibited(
            Uuid::now_v7(),
            fingerprint,
            inhibited_by,
        ));
    }

    fn flush(&self) -> Result<(), StateLogError> {
        let mut inner = self.lock();
        self.flush_locked(&mut inner)
    }

    fn close(&self) -> Result<(), StateLogError> {
        let mut inner = self.lock();
        if inner.db.is_none() {
            return Err(StateLogError::Closed);
        }
        self.flush_locked(&mut inner)
            .map_err(|e| StateLogError::CloseFailed(e.to_string()))?;
        inner.db = None;
        Ok(())
    }
}

impl StateEventStore for RedbStateAppender {
    fn query_events(&self, query: &StateEventQuery) -> Result<Vec<StateEvent>, StateLogError> {
        let inner = self.lock();
        let db = inner.db.as_ref().ok_or(StateLogError::Closed)?;

        let txn = db
            .begin_read()
            .map_err(|e| StateLogError::QueryFailed(format!("redb read txn: {e}")))?;
        let states = txn
            .open_table(STATES_TABLE)
            .map_err(|e| StateLogError::QueryFailed(format!("redb read table: {e}")))?;

        let events: Vec<StateEvent> = if let Some(fp) = query.fingerprint {
            let index = txn
                .open_table(BY_FINGERPRINT_TABLE)
                .map_err(|e| StateLogError::QueryFailed(format!("redb index table: {e}")))?;
            let ids: Vec<u128> = index
                .range((fp.as_u64(), 0u128)..=(fp.as_u64(), u128::MAX))
                .map_err(|e| StateLogError::QueryFailed(format!("redb index range: {e}")))?
                .filter_map(Result::ok)
                .map(|(k, _v)| k.value().1)
                .collect();

            let mut events = Vec::with_capacity(ids.len());
            for id in ids {
                let row = states
                    .get(id)
                    .map_err(|e| StateLogError::QueryFailed(format!("redb get: {e}")))?;
                if let Some(row) = row
                    && let Ok(event) = serde_json::from_slice::<StateEvent>(row.value())
                {
                    events.push(event);
                }
            }
            events
        } else {
            states
                .iter()
                .map_err(|e| StateLogError::QueryFailed(format!("redb iter: {e}")))?
                .filter_map(Result::ok)
                .filter_map(|(_k, v)| serde_json::from_slice::<StateEvent>(v.value()).ok())
                .collect()
        };

        let limit = if query.limit == 0 {
            usize::MAX
        } else {
            query.limit
        };
        Ok(events
            .into_iter()
            .filter(|e| query.matches(e))
            .skip(query.offset)
            .take(limit)
            .collect())
    }

    fn event_count(&self) -> Result<usize, StateLogError> {
        let inner = self.lock();
        let db = inner.db.as_ref().ok_or(StateLogError::Closed)?;

        let txn = db
            .begin_read()
            .map_err(|e| StateLogError::QueryFailed(format!("redb count txn: {e}")))?;
        let table = txn
            .open_table(STATES_TABLE)
            .map_err(|e| StateLogError::QueryFailed(format!("redb count table: {e}")))?;
        let count = table
            .len()
            .map_err(|e| StateLogError::QueryFailed(format!("redb count: {e}")))?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(count as usize)
    }
}
