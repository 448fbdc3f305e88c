use crate::api::ApiClient;
use crate::models::MenuId;
use leptos::prelude::*;

pub(crate) mod menu_store;

pub(crate) use menu_store::MenuStore;

#[derive(Clone)]
pub(crate) struct AppState {
    /// Canonical menu forest + load/mutation machinery.
    pub store: MenuStore,
}

impl AppState {
    pub fn new() -> Self {
        let api_client = RwSignal::new(ApiClient::from_env());
        Self {
            store: MenuStore::new(api_client),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

/// Row-level actions exposed to the tree (add child / edit / delete).
#[derive(Clone)]
pub(crate) struct MenuUiActions {
    pub open_add_root: Callback<()>,
    pub open_add_child: Callback<MenuId>,
    pub open_edit: Callback<MenuId>,
    pub request_delete: Callback<MenuId>,
}

/// Operator confirmation gate for destructive actions.
///
/// Injected as a capability so callers (and tests) can swap the browser
/// dialog for their own answer.
#[derive(Clone, Copy)]
pub(crate) struct ConfirmPort(pub Callback<String, bool>);

impl ConfirmPort {
    pub fn browser() -> Self {
        Self(Callback::new(|message: String| {
            window().confirm_with_message(&message).unwrap_or(false)
        }))
    }

    pub fn ask(&self, message: impl Into<String>) -> bool {
        self.0.run(message.into())
    }
}
