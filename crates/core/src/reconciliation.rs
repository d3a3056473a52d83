//! Attendance reconciliation session.
//!
//! One admin edits one occasion at a time. The session remembers the
//! occasion the roster was loaded from (`original_key`) separately from the
//! occasion currently selected in the form (`selected_key`). Saving when the
//! two differ is a *move*: the rows are relocated to the selected occasion
//! and merged with anything already recorded there, after the admin
//! confirms. A move carries only rows that say something: members marked
//! present, rows with a note, and rows the admin touched in this session.
//! Default rows would otherwise overwrite records already kept at the
//! destination.
//!
//! ```text
//! Viewing --edit--> Dirty --save--> Saving --ok--> Viewing
//!                     ^  \                 \--err--> Dirty (rolled back)
//!                     |   \--save, key changed--> ConfirmingMove
//!                     \------------cancel------------/      |
//!                                                  confirm -> Saving
//! ```
//!
//! State lives behind a mutex that is never held across a request, so a
//! second save issued while one is in flight observes `Saving` and is
//! ignored rather than queued.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::attendance::{
    ensure_not_future, AttendanceEntry, AttendanceKey, AttendanceRow, AttendanceStatus,
    SaveCommand,
};
use crate::store::{AttendanceStore, ConsoleError};
use crate::types::DbId;

/// Where the editing session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Rows match what the server last returned.
    Viewing,
    /// Local edits not yet saved.
    Dirty,
    /// A move is waiting for the admin to confirm or cancel.
    ConfirmingMove,
    /// A save or move request is in flight.
    Saving,
}

/// Shown to the admin before a move is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRisk {
    pub from: AttendanceKey,
    pub to: AttendanceKey,
    pub row_count: usize,
}

impl ConflictRisk {
    pub fn prompt(&self) -> String {
        format!(
            "Attendance for {} ({} rows) will be moved to {} and merged with any \
             records already saved there. Continue?",
            self.from, self.row_count, self.to
        )
    }
}

/// Result of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { key: AttendanceKey },
    Moved { from: AttendanceKey, to: AttendanceKey },
    /// Nothing was sent; call [`AttendanceSession::confirm_move`] to proceed.
    ConfirmationRequired(ConflictRisk),
    /// A save was already in flight; this one was dropped.
    Ignored,
}

/// State restored when a save or move fails.
struct SessionSnapshot {
    rows: Vec<AttendanceRow>,
    original_key: AttendanceKey,
}

struct SessionState {
    original_key: AttendanceKey,
    selected_key: AttendanceKey,
    rows: Vec<AttendanceRow>,
    /// Members edited since the roster was last loaded or saved.
    touched: HashSet<DbId>,
    phase: SessionPhase,
    pending_move: Option<SaveCommand>,
}

impl SessionState {
    fn entries(&self) -> Vec<AttendanceEntry> {
        self.rows.iter().map(AttendanceRow::entry).collect()
    }

    fn move_entries(&self) -> Vec<AttendanceEntry> {
        self.rows
            .iter()
            .filter(|r| !r.is_default() || self.touched.contains(&r.member.id))
            .map(AttendanceRow::entry)
            .collect()
    }

    fn reset(&mut self, key: AttendanceKey, rows: Vec<AttendanceRow>) {
        self.rows = rows;
        self.original_key = key;
        self.selected_key = key;
        self.touched.clear();
        self.phase = SessionPhase::Viewing;
        self.pending_move = None;
    }

    fn ensure_editable(&self) -> Result<(), ConsoleError> {
        if self.phase == SessionPhase::Saving {
            return Err(ConsoleError::Busy);
        }
        Ok(())
    }

    fn row_mut(&mut self, member_id: DbId) -> Result<&mut AttendanceRow, ConsoleError> {
        self.rows
            .iter_mut()
            .find(|r| r.member.id == member_id)
            .ok_or(ConsoleError::UnknownMember(member_id))
    }

    fn begin_save(&mut self) -> SessionSnapshot {
        self.phase = SessionPhase::Saving;
        self.pending_move = None;
        SessionSnapshot {
            rows: self.rows.clone(),
            original_key: self.original_key,
        }
    }
}

/// A single admin's attendance editing session.
pub struct AttendanceSession<S> {
    store: S,
    state: Mutex<SessionState>,
}

impl<S: AttendanceStore> AttendanceSession<S> {
    /// Load the roster for `key` and start viewing it.
    pub async fn open(store: S, key: AttendanceKey) -> Result<Self, ConsoleError> {
        let rows = store.load_records(key).await?;
        Ok(Self {
            store,
            state: Mutex::new(SessionState {
                original_key: key,
                selected_key: key,
                rows,
                touched: HashSet::new(),
                phase: SessionPhase::Viewing,
                pending_move: None,
            }),
        })
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn rows(&self) -> Vec<AttendanceRow> {
        self.state.lock().await.rows.clone()
    }

    pub async fn original_key(&self) -> AttendanceKey {
        self.state.lock().await.original_key
    }

    pub async fn selected_key(&self) -> AttendanceKey {
        self.state.lock().await.selected_key
    }

    /// Whether the selection differs from the occasion the rows came from.
    pub async fn selection_changed(&self) -> bool {
        let state = self.state.lock().await;
        state.original_key != state.selected_key
    }

    /// Discard local rows and load `key` from the server.
    pub async fn load(&self, key: AttendanceKey) -> Result<(), ConsoleError> {
        self.state.lock().await.ensure_editable()?;

        let rows = self.store.load_records(key).await?;

        let mut state = self.state.lock().await;
        state.ensure_editable()?;
        state.reset(key, rows);
        tracing::debug!(%key, rows = state.rows.len(), "Attendance roster loaded");
        Ok(())
    }

    /// Change the selected occasion without reloading. Saving afterwards
    /// becomes a move.
    pub async fn select(&self, key: AttendanceKey) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().await;
        state.ensure_editable()?;
        state.selected_key = key;
        if state.phase == SessionPhase::ConfirmingMove {
            state.pending_move = None;
            state.phase = SessionPhase::Dirty;
        }
        Ok(())
    }

    pub async fn set_status(
        &self,
        member_id: DbId,
        status: AttendanceStatus,
    ) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().await;
        state.ensure_editable()?;
        state.row_mut(member_id)?.status = status;
        state.touched.insert(member_id);
        state.pending_move = None;
        state.phase = SessionPhase::Dirty;
        Ok(())
    }

    /// Set every row on the roster to `status`.
    pub async fn mark_all(&self, status: AttendanceStatus) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().await;
        state.ensure_editable()?;
        for row in &mut state.rows {
            row.status = status;
        }
        let ids: Vec<DbId> = state.rows.iter().map(|r| r.member.id).collect();
        state.touched.extend(ids);
        state.pending_move = None;
        state.phase = SessionPhase::Dirty;
        Ok(())
    }

    /// Save the roster under the selected occasion.
    ///
    /// Rejects future dates before any request. When the selection changed
    /// since loading, nothing is sent and the returned
    /// [`SaveOutcome::ConfirmationRequired`] describes the move.
    pub async fn save(&self, today: NaiveDate) -> Result<SaveOutcome, ConsoleError> {
        let (command, snapshot) = {
            let mut state = self.state.lock().await;
            if state.phase == SessionPhase::Saving {
                tracing::debug!("Save ignored, another save is in flight");
                return Ok(SaveOutcome::Ignored);
            }
            ensure_not_future(state.selected_key.date, today)?;

            let entries = if state.original_key == state.selected_key {
                state.entries()
            } else {
                state.move_entries()
            };
            let command = SaveCommand::decide(state.original_key, state.selected_key, entries);
            if let SaveCommand::RelocateAndMerge { from, to, entries } = &command {
                let risk = ConflictRisk {
                    from: *from,
                    to: *to,
                    row_count: entries.len(),
                };
                state.pending_move = Some(command);
                state.phase = SessionPhase::ConfirmingMove;
                return Ok(SaveOutcome::ConfirmationRequired(risk));
            }

            let snapshot = state.begin_save();
            (command, snapshot)
        };

        self.execute(command, snapshot).await
    }

    /// Send the move the admin was asked to confirm.
    pub async fn confirm_move(&self) -> Result<SaveOutcome, ConsoleError> {
        let (command, snapshot) = {
            let mut state = self.state.lock().await;
            if state.phase == SessionPhase::Saving {
                return Ok(SaveOutcome::Ignored);
            }
            let command = state.pending_move.take().ok_or(ConsoleError::NoPendingMove)?;
            let snapshot = state.begin_save();
            (command, snapshot)
        };

        self.execute(command, snapshot).await
    }

    /// Drop the pending move and go back to editing.
    pub async fn cancel_move(&self) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().await;
        if state.pending_move.take().is_none() {
            return Err(ConsoleError::NoPendingMove);
        }
        state.phase = SessionPhase::Dirty;
        Ok(())
    }

    /// Update one member's note and immediately send the whole roster.
    ///
    /// The note stays in local state even when the request fails; only
    /// batch saves roll back. A pending move is dropped and has to be
    /// confirmed again.
    pub async fn edit_note(
        &self,
        member_id: DbId,
        notes: impl Into<String>,
        today: NaiveDate,
    ) -> Result<(), ConsoleError> {
        let (key, entries, name) = {
            let mut state = self.state.lock().await;
            state.ensure_editable()?;
            let row = state.row_mut(member_id)?;
            row.notes = notes.into();
            let name = row.member.display_name();
            state.touched.insert(member_id);
            // A move built before this edit would carry stale rows.
            if state.pending_move.take().is_some() {
                state.phase = SessionPhase::Dirty;
            }
            (state.original_key, state.entries(), name)
        };

        ensure_not_future(key.date, today)?;

        if let Err(err) = self.store.upsert_batch(key, &entries).await {
            tracing::warn!(%key, member = %name, error = %err, "Note save failed");
            return Err(err.into());
        }
        Ok(())
    }

    async fn execute(
        &self,
        command: SaveCommand,
        snapshot: SessionSnapshot,
    ) -> Result<SaveOutcome, ConsoleError> {
        let result = match &command {
            SaveCommand::SaveInPlace { key, entries } => self.store.upsert_batch(*key, entries).await,
            SaveCommand::RelocateAndMerge { from, to, entries } => {
                self.store.move_batch(*from, *to, entries).await
            }
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(rows) => {
                let target = command.target();
                state.reset(target, rows);

                let outcome = match command {
                    SaveCommand::SaveInPlace { key, .. } => SaveOutcome::Saved { key },
                    SaveCommand::RelocateAndMerge { from, to, .. } => SaveOutcome::Moved { from, to },
                };
                tracing::info!(key = %target, rows = state.rows.len(), "Attendance saved");
                Ok(outcome)
            }
            Err(err) => {
                state.rows = snapshot.rows;
                state.original_key = snapshot.original_key;
                state.phase = SessionPhase::Dirty;
                tracing::warn!(error = %err, "Attendance save failed, local changes restored");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::attendance::{MemberRef, ServiceType};
    use crate::store::TransportError;

    // -----------------------------------------------------------------------
    // In-memory store
    // -----------------------------------------------------------------------

    type Records = HashMap<(AttendanceKey, DbId), (AttendanceStatus, String)>;

    #[derive(Default)]
    struct FakeStore {
        members: Vec<MemberRef>,
        records: StdMutex<Records>,
        calls: AtomicUsize,
        fail: AtomicBool,
        /// When set, writes wait on this before completing.
        gate: Option<Arc<Notify>>,
    }

    impl FakeStore {
        fn with_members(names: &[(&str, &str)]) -> Self {
            let members = names
                .iter()
                .enumerate()
                .map(|(i, (first, last))| MemberRef {
                    id: i as DbId + 1,
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                })
                .collect();
            Self {
                members,
                ..Default::default()
            }
        }

        fn record(&self, key: AttendanceKey, member_id: DbId, status: AttendanceStatus) {
            self.records
                .lock()
                .unwrap()
                .insert((key, member_id), (status, String::new()));
        }

        fn roster(&self, key: AttendanceKey) -> Vec<AttendanceRow> {
            let records = self.records.lock().unwrap();
            self.members
                .iter()
                .map(|m| match records.get(&(key, m.id)) {
                    Some((status, notes)) => AttendanceRow {
                        member: m.clone(),
                        status: *status,
                        notes: notes.clone(),
                    },
                    None => AttendanceRow::absent(m.clone()),
                })
                .collect()
        }

        fn write(&self, key: AttendanceKey, entries: &[AttendanceEntry]) {
            let mut records = self.records.lock().unwrap();
            for e in entries {
                records.insert((key, e.member_id), (e.status, e.notes.clone()));
            }
        }

        async fn before_write(&self) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::status(500, "boom"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AttendanceStore for Arc<FakeStore> {
        async fn load_records(
            &self,
            key: AttendanceKey,
        ) -> Result<Vec<AttendanceRow>, TransportError> {
            Ok(self.roster(key))
        }

        async fn upsert_batch(
            &self,
            key: AttendanceKey,
            entries: &[AttendanceEntry],
        ) -> Result<Vec<AttendanceRow>, TransportError> {
            self.before_write().await?;
            self.write(key, entries);
            Ok(self.roster(key))
        }

        async fn move_batch(
            &self,
            from: AttendanceKey,
            to: AttendanceKey,
            entries: &[AttendanceEntry],
        ) -> Result<Vec<AttendanceRow>, TransportError> {
            self.before_write().await?;
            self.records.lock().unwrap().retain(|(k, _), _| *k != from);
            self.write(to, entries);
            Ok(self.roster(to))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn worship(d: NaiveDate) -> AttendanceKey {
        AttendanceKey::new(d, ServiceType::Worship)
    }

    fn status_of(rows: &[AttendanceRow], member_id: DbId) -> AttendanceStatus {
        rows.iter().find(|r| r.member.id == member_id).unwrap().status
    }

    fn today() -> NaiveDate {
        date(2024, 5, 20)
    }

    // -----------------------------------------------------------------------
    // Save in place
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn save_with_one_present_leaves_other_absent() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A"), ("Ben", "B")]));
        let key = worship(date(2024, 5, 5));
        let session = AttendanceSession::open(Arc::clone(&store), key).await.unwrap();

        session.set_status(1, AttendanceStatus::Present).await.unwrap();
        assert_eq!(session.phase().await, SessionPhase::Dirty);

        let outcome = session.save(today()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { key });
        assert_eq!(session.phase().await, SessionPhase::Viewing);

        let rows = store.roster(key);
        assert_eq!(rows.len(), 2);
        assert_eq!(status_of(&rows, 1), AttendanceStatus::Present);
        assert_eq!(status_of(&rows, 2), AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn future_date_rejected_without_request() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let session = AttendanceSession::open(Arc::clone(&store), worship(date(2024, 5, 5)))
            .await
            .unwrap();

        session.select(worship(date(2024, 5, 21))).await.unwrap();
        let err = session.save(today()).await.unwrap_err();

        assert_matches!(err, ConsoleError::Validation(_));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_today_is_allowed() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let session = AttendanceSession::open(Arc::clone(&store), worship(today()))
            .await
            .unwrap();
        assert_matches!(session.save(today()).await, Ok(SaveOutcome::Saved { .. }));
    }

    #[tokio::test]
    async fn failed_save_rolls_back_to_snapshot() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let key = worship(date(2024, 5, 5));
        let session = AttendanceSession::open(Arc::clone(&store), key).await.unwrap();

        session.set_status(1, AttendanceStatus::Present).await.unwrap();
        store.fail.store(true, Ordering::SeqCst);

        let err = session.save(today()).await.unwrap_err();
        assert_matches!(err, ConsoleError::Transport(TransportError { status: Some(500), .. }));
        assert_eq!(session.phase().await, SessionPhase::Dirty);
        // Local edit is kept so the admin can retry.
        assert_eq!(status_of(&session.rows().await, 1), AttendanceStatus::Present);
        assert_eq!(session.original_key().await, key);
    }

    #[tokio::test]
    async fn second_save_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let mut fake = FakeStore::with_members(&[("Ann", "A")]);
        fake.gate = Some(Arc::clone(&gate));
        let store = Arc::new(fake);

        let session = Arc::new(
            AttendanceSession::open(Arc::clone(&store), worship(date(2024, 5, 5)))
                .await
                .unwrap(),
        );

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.save(today()).await })
        };
        while session.phase().await != SessionPhase::Saving {
            tokio::task::yield_now().await;
        }

        assert_eq!(session.save(today()).await.unwrap(), SaveOutcome::Ignored);
        assert_matches!(
            session.set_status(1, AttendanceStatus::Present).await,
            Err(ConsoleError::Busy)
        );

        gate.notify_one();
        assert_matches!(first.await.unwrap(), Ok(SaveOutcome::Saved { .. }));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    // -----------------------------------------------------------------------
    // Move
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn changed_selection_requires_confirmation() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let from = worship(date(2024, 5, 5));
        let to = worship(date(2024, 5, 12));
        store.record(from, 1, AttendanceStatus::Present);
        let session = AttendanceSession::open(Arc::clone(&store), from).await.unwrap();

        session.select(to).await.unwrap();
        assert!(session.selection_changed().await);

        let outcome = session.save(today()).await.unwrap();
        let risk = assert_matches!(outcome, SaveOutcome::ConfirmationRequired(risk) => risk);
        assert_eq!(risk.from, from);
        assert_eq!(risk.to, to);
        assert_eq!(risk.row_count, 1);
        assert!(risk.prompt().contains("merged"));
        assert_eq!(session.phase().await, SessionPhase::ConfirmingMove);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn confirmed_move_merges_with_destination() {
        let store = Arc::new(FakeStore::with_members(&[
            ("Ann", "A"),
            ("Ben", "B"),
            ("Cal", "C"),
        ]));
        let from = worship(date(2024, 5, 5));
        let to = worship(date(2024, 5, 12));
        store.record(from, 1, AttendanceStatus::Present);
        store.record(to, 3, AttendanceStatus::Present);

        let session = AttendanceSession::open(Arc::clone(&store), from).await.unwrap();
        session.select(to).await.unwrap();

        // Ben and Cal are default rows at the origin and stay off the wire.
        let outcome = session.save(today()).await.unwrap();
        let risk = assert_matches!(outcome, SaveOutcome::ConfirmationRequired(risk) => risk);
        assert_eq!(risk.row_count, 1);

        let outcome = session.confirm_move().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Moved { from, to });
        assert_eq!(session.original_key().await, to);
        assert!(!session.selection_changed().await);
        assert_eq!(session.phase().await, SessionPhase::Viewing);

        let origin = store.roster(from);
        assert!(origin.iter().all(AttendanceRow::is_default));

        let dest = session.rows().await;
        assert_eq!(dest.len(), 3);
        assert_eq!(status_of(&dest, 1), AttendanceStatus::Present);
        assert_eq!(status_of(&dest, 2), AttendanceStatus::Absent);
        assert_eq!(status_of(&dest, 3), AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn move_sends_rows_the_admin_marked_absent() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A"), ("Ben", "B")]));
        let from = worship(date(2024, 5, 5));
        let to = worship(date(2024, 5, 12));
        store.record(from, 1, AttendanceStatus::Present);
        store.record(to, 2, AttendanceStatus::Present);

        let session = AttendanceSession::open(Arc::clone(&store), from).await.unwrap();
        session.set_status(2, AttendanceStatus::Absent).await.unwrap();
        session.select(to).await.unwrap();
        session.save(today()).await.unwrap();
        session.confirm_move().await.unwrap();

        let dest = store.roster(to);
        assert_eq!(status_of(&dest, 1), AttendanceStatus::Present);
        assert_eq!(status_of(&dest, 2), AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn cancelled_move_returns_to_dirty() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let session = AttendanceSession::open(Arc::clone(&store), worship(date(2024, 5, 5)))
            .await
            .unwrap();
        session.select(worship(date(2024, 5, 12))).await.unwrap();
        session.save(today()).await.unwrap();

        session.cancel_move().await.unwrap();
        assert_eq!(session.phase().await, SessionPhase::Dirty);
        assert_matches!(session.confirm_move().await, Err(ConsoleError::NoPendingMove));
        assert_matches!(session.cancel_move().await, Err(ConsoleError::NoPendingMove));
    }

    #[tokio::test]
    async fn failed_move_keeps_original_key() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let from = worship(date(2024, 5, 5));
        let session = AttendanceSession::open(Arc::clone(&store), from).await.unwrap();
        session.select(worship(date(2024, 5, 12))).await.unwrap();
        session.save(today()).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        assert_matches!(session.confirm_move().await, Err(ConsoleError::Transport(_)));
        assert_eq!(session.original_key().await, from);
        assert!(session.selection_changed().await);
        assert_eq!(session.phase().await, SessionPhase::Dirty);
    }

    // -----------------------------------------------------------------------
    // Notes, loading
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn note_edit_sends_full_roster() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A"), ("Ben", "B")]));
        let key = worship(date(2024, 5, 5));
        let session = AttendanceSession::open(Arc::clone(&store), key).await.unwrap();

        session.edit_note(2, "arrived late", today()).await.unwrap();

        let rows = store.roster(key);
        assert_eq!(rows[1].notes, "arrived late");
        assert_eq!(store.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_note_edit_keeps_local_text() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let session = AttendanceSession::open(Arc::clone(&store), worship(date(2024, 5, 5)))
            .await
            .unwrap();
        store.fail.store(true, Ordering::SeqCst);

        assert_matches!(
            session.edit_note(1, "visitor", today()).await,
            Err(ConsoleError::Transport(_))
        );
        assert_eq!(session.rows().await[0].notes, "visitor");
    }

    #[tokio::test]
    async fn note_edit_during_pending_move_is_carried_by_the_move() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A"), ("Ben", "B")]));
        let from = worship(date(2024, 5, 5));
        let to = worship(date(2024, 5, 12));
        store.record(from, 1, AttendanceStatus::Present);

        let session = AttendanceSession::open(Arc::clone(&store), from).await.unwrap();
        session.select(to).await.unwrap();
        assert_matches!(
            session.save(today()).await,
            Ok(SaveOutcome::ConfirmationRequired(_))
        );
        assert_eq!(session.phase().await, SessionPhase::ConfirmingMove);

        session.edit_note(1, "arrived late", today()).await.unwrap();
        session.edit_note(2, "visitor guest", today()).await.unwrap();
        assert_eq!(session.phase().await, SessionPhase::Dirty);
        assert_matches!(session.confirm_move().await, Err(ConsoleError::NoPendingMove));

        let risk = assert_matches!(
            session.save(today()).await,
            Ok(SaveOutcome::ConfirmationRequired(risk)) => risk
        );
        assert_eq!(risk.row_count, 2);
        assert_eq!(
            session.confirm_move().await.unwrap(),
            SaveOutcome::Moved { from, to }
        );

        let dest = store.roster(to);
        assert_eq!(dest[0].status, AttendanceStatus::Present);
        assert_eq!(dest[0].notes, "arrived late");
        assert_eq!(dest[1].notes, "visitor guest");
        assert!(store.roster(from).iter().all(AttendanceRow::is_default));

        let local = session.rows().await;
        assert_eq!(local[0].notes, "arrived late");
        assert_eq!(local[1].notes, "visitor guest");
    }

    #[tokio::test]
    async fn note_for_unknown_member_rejected() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let session = AttendanceSession::open(Arc::clone(&store), worship(date(2024, 5, 5)))
            .await
            .unwrap();
        assert_matches!(
            session.edit_note(42, "?", today()).await,
            Err(ConsoleError::UnknownMember(42))
        );
    }

    #[tokio::test]
    async fn load_resets_selection_and_rows() {
        let store = Arc::new(FakeStore::with_members(&[("Ann", "A")]));
        let other = worship(date(2024, 5, 12));
        store.record(other, 1, AttendanceStatus::Present);

        let session = AttendanceSession::open(Arc::clone(&store), worship(date(2024, 5, 5)))
            .await
            .unwrap();
        session.mark_all(AttendanceStatus::Present).await.unwrap();
        session.load(other).await.unwrap();

        assert_eq!(session.original_key().await, other);
        assert_eq!(session.phase().await, SessionPhase::Viewing);
        assert_eq!(status_of(&session.rows().await, 1), AttendanceStatus::Present);
    }
}
