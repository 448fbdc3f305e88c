use crate::api::{ApiClient, ApiError, ApiErrorKind};
use crate::models::{build_forest, contains_id, would_create_cycle, MenuId, MenuRecord};
use crate::session::{validate_fields, MenuDraft};
use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StorePhase {
    Empty,
    Loading,
    Ready,
    /// Terminal only while nothing was ever loaded; a later `load()` retries.
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StoreErrorKind {
    Validation,
    Cycle,
    Write,
    Load,
}

#[derive(Clone, Debug)]
pub(crate) struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Validation,
            message: message.into(),
        }
    }

    pub(crate) fn cycle(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Cycle,
            message: message.into(),
        }
    }

    fn write(e: ApiError) -> Self {
        Self {
            kind: StoreErrorKind::Write,
            message: e.to_string(),
        }
    }
}

/// Owns the canonical forest and mediates every mutation through the
/// persistence collaborator; the server stays the source of truth, so a
/// successful write is always followed by a full reload rather than a
/// local splice.
#[derive(Clone, Copy)]
pub(crate) struct MenuStore {
    api_client: RwSignal<ApiClient>,

    pub forest: RwSignal<Vec<MenuRecord>>,
    pub phase: RwSignal<StorePhase>,

    /// Last load failure, shown in the page banner. Cleared on success.
    pub error: RwSignal<Option<String>>,

    /// Load sequencing: responses are applied last-completion-wins.
    /// `load_seq` tags each issued load; `applied_seq` is the newest tag
    /// whose response made it into `forest`. Anything older is discarded.
    load_seq: RwSignal<u64>,
    applied_seq: RwSignal<u64>,
}

impl MenuStore {
    pub fn new(api_client: RwSignal<ApiClient>) -> Self {
        Self {
            api_client,
            forest: RwSignal::new(vec![]),
            phase: RwSignal::new(StorePhase::Empty),
            error: RwSignal::new(None),
            load_seq: RwSignal::new(0),
            applied_seq: RwSignal::new(0),
        }
    }

    /// Mutations are only valid once a load has succeeded. The UI disables
    /// actions outside `Ready`; this is the second line of defense.
    pub fn can_mutate(&self) -> bool {
        self.phase.get_untracked() == StorePhase::Ready
    }

    fn begin_load(&self) -> u64 {
        let seq = self.load_seq.get_untracked() + 1;
        self.load_seq.set(seq);
        self.phase.set(StorePhase::Loading);
        seq
    }

    fn finish_load(&self, seq: u64, outcome: Result<Vec<MenuRecord>, ApiError>) {
        if seq <= self.applied_seq.get_untracked() {
            // A newer load already resolved; this response is stale.
            return;
        }

        match outcome {
            Ok(records) => {
                self.forest.set(build_forest(records));
                self.applied_seq.set(seq);
                self.error.set(None);
                self.phase.set(StorePhase::Ready);
            }
            Err(e) => {
                let message = if e.kind == ApiErrorKind::Network {
                    format!("Backend not reachable: {e}")
                } else {
                    e.to_string()
                };
                self.error.set(Some(message));
                // Keep the stale-but-valid forest when we ever had one.
                if self.applied_seq.get_untracked() > 0 {
                    self.phase.set(StorePhase::Ready);
                } else {
                    self.phase.set(StorePhase::Error);
                }
            }
        }
    }

    /// Fetch the full node set and replace the forest atomically.
    pub async fn load(&self) {
        let api = self.api_client.get_untracked();
        let seq = self.begin_load();
        let outcome = api.list_menus().await;
        self.finish_load(seq, outcome);
    }

    fn guard_ready(&self) -> Result<(), StoreError> {
        if self.can_mutate() {
            Ok(())
        } else {
            Err(StoreError::validation("Menus are still loading"))
        }
    }

    /// Create a menu from a draft. Validates locally before any network
    /// call; on success the assigned id and authoritative ordering come
    /// back via the reload.
    pub async fn create(&self, draft: &MenuDraft) -> Result<(), StoreError> {
        self.guard_ready()?;
        validate_fields(draft)?;

        if let Some(p) = draft.parent_id {
            let forest = self.forest.get_untracked();
            if !contains_id(&forest, p) {
                return Err(StoreError::validation(format!("Unknown parent menu {p}")));
            }
        }

        let api = self.api_client.get_untracked();
        api.create_menu(&draft.to_write_request())
            .await
            .map_err(StoreError::write)?;
        self.load().await;
        Ok(())
    }

    /// Update a menu, including reparenting. Cycle prevention runs against
    /// the current local forest before anything is sent.
    pub async fn update(&self, id: MenuId, draft: &MenuDraft) -> Result<(), StoreError> {
        self.guard_ready()?;
        validate_fields(draft)?;

        {
            let forest = self.forest.get_untracked();
            if !contains_id(&forest, id) {
                return Err(StoreError::validation(format!("Unknown menu {id}")));
            }
            if would_create_cycle(&forest, id, draft.parent_id) {
                return Err(StoreError::cycle(
                    "A menu cannot be moved under itself or one of its descendants",
                ));
            }
            if let Some(p) = draft.parent_id {
                if !contains_id(&forest, p) {
                    return Err(StoreError::validation(format!("Unknown parent menu {p}")));
                }
            }
        }

        let api = self.api_client.get_untracked();
        api.update_menu(id, &draft.to_write_request())
            .await
            .map_err(StoreError::write)?;
        self.load().await;
        Ok(())
    }

    /// Delete a menu. Operator confirmation is the caller's capability.
    /// Exactly one DELETE request; descendants are the collaborator's
    /// responsibility; local state is untouched on failure.
    pub async fn remove(&self, id: MenuId) -> Result<(), StoreError> {
        self.guard_ready()?;

        let api = self.api_client.get_untracked();
        api.delete_menu(id).await.map_err(StoreError::write)?;
        self.load().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MenuStore {
        MenuStore::new(RwSignal::new(ApiClient::new("http://test".to_string())))
    }

    fn record(id: MenuId, name: &str) -> MenuRecord {
        MenuRecord {
            id,
            parent_id: None,
            name: name.to_string(),
            url: None,
            order_no: 0,
            children: vec![],
        }
    }

    fn load_error(msg: &str) -> ApiError {
        // Only the message matters to the store.
        ApiError {
            kind: crate::api::ApiErrorKind::Http,
            message: msg.to_string(),
        }
    }

    #[test]
    fn test_store_starts_empty_and_blocks_mutations() {
        let s = store();
        assert_eq!(s.phase.get_untracked(), StorePhase::Empty);
        assert!(!s.can_mutate());
    }

    #[test]
    fn test_load_success_reaches_ready() {
        let s = store();
        let seq = s.begin_load();
        assert_eq!(s.phase.get_untracked(), StorePhase::Loading);

        s.finish_load(seq, Ok(vec![record(1, "Home")]));
        assert_eq!(s.phase.get_untracked(), StorePhase::Ready);
        assert_eq!(s.forest.get_untracked().len(), 1);
        assert!(s.error.get_untracked().is_none());
        assert!(s.can_mutate());
    }

    #[test]
    fn test_first_load_failure_is_terminal_error() {
        let s = store();
        let seq = s.begin_load();
        s.finish_load(seq, Err(load_error("boom")));

        assert_eq!(s.phase.get_untracked(), StorePhase::Error);
        assert_eq!(s.error.get_untracked().as_deref(), Some("boom"));
        assert!(!s.can_mutate());
    }

    #[test]
    fn test_load_failure_after_success_keeps_stale_forest() {
        let s = store();
        let seq = s.begin_load();
        s.finish_load(seq, Ok(vec![record(1, "Home")]));

        let seq = s.begin_load();
        s.finish_load(seq, Err(load_error("down")));

        // Degrades back to Ready with the previous forest intact.
        assert_eq!(s.phase.get_untracked(), StorePhase::Ready);
        assert_eq!(s.forest.get_untracked().len(), 1);
        assert_eq!(s.error.get_untracked().as_deref(), Some("down"));
    }

    #[test]
    fn test_stale_load_response_is_discarded() {
        let s = store();
        let old = s.begin_load();
        let new = s.begin_load();

        // The later-issued load completes first and wins.
        s.finish_load(new, Ok(vec![record(2, "Fresh")]));
        s.finish_load(old, Ok(vec![record(1, "Stale")]));

        let forest = s.forest.get_untracked();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "Fresh");
    }

    #[test]
    fn test_stale_error_does_not_clobber_newer_success() {
        let s = store();
        let old = s.begin_load();
        let new = s.begin_load();

        s.finish_load(new, Ok(vec![record(2, "Fresh")]));
        s.finish_load(old, Err(load_error("slow failure")));

        assert_eq!(s.phase.get_untracked(), StorePhase::Ready);
        assert!(s.error.get_untracked().is_none());
    }

    #[test]
    fn test_store_error_display_is_message() {
        let e = StoreError::cycle("no loops");
        assert_eq!(e.kind, StoreErrorKind::Cycle);
        assert_eq!(e.to_string(), "no loops");
    }

    fn poll_once<F: std::future::Future>(fut: F) -> std::task::Poll<F::Output> {
        use std::task::{Context, RawWaker, RawWakerVTable, Waker};

        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            RawWaker::new(std::ptr::null(), &VTABLE)
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);

        let waker = unsafe { Waker::from_raw(RawWaker::new(std::ptr::null(), &VTABLE)) };
        let mut cx = Context::from_waker(&waker);
        let mut fut = Box::pin(fut);
        fut.as_mut().poll(&mut cx)
    }

    #[test]
    fn test_update_rejects_cycle_before_any_request() {
        let s = store();
        let seq = s.begin_load();
        let child = MenuRecord {
            parent_id: Some(1),
            ..record(2, "About")
        };
        s.finish_load(seq, Ok(vec![record(1, "Home"), child]));

        // Reparent 1 under its own child. The rejection must come from the
        // local forest check: the future resolves on the first poll, so no
        // request was ever started.
        let draft = MenuDraft {
            parent_id: Some(2),
            name: "Home".to_string(),
            url: String::new(),
            order_no: 0,
        };

        match poll_once(s.update(1, &draft)) {
            std::task::Poll::Ready(Err(e)) => assert_eq!(e.kind, StoreErrorKind::Cycle),
            _ => panic!("cycle must be rejected synchronously"),
        }
    }

    #[test]
    fn test_create_rejects_unknown_parent_before_any_request() {
        let s = store();
        let seq = s.begin_load();
        s.finish_load(seq, Ok(vec![record(1, "Home")]));

        let draft = MenuDraft {
            parent_id: Some(42),
            name: "Orphan".to_string(),
            url: String::new(),
            order_no: 0,
        };

        match poll_once(s.create(&draft)) {
            std::task::Poll::Ready(Err(e)) => assert_eq!(e.kind, StoreErrorKind::Validation),
            _ => panic!("unknown parent must be rejected synchronously"),
        }
    }
}
