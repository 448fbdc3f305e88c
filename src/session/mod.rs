use crate::api::MenuWriteRequest;
use crate::models::{MenuId, MenuRecord};
use crate::state::menu_store::StoreError;

/// In-progress, unsaved menu entry. Field types mirror the form, not the
/// wire: `url` keeps the raw text (empty means none) and `order_no` may
/// hold a negative value until validation rejects it.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MenuDraft {
    pub parent_id: Option<MenuId>,
    pub name: String,
    pub url: String,
    pub order_no: i64,
}

impl MenuDraft {
    pub fn from_record(r: &MenuRecord) -> Self {
        Self {
            parent_id: r.parent_id,
            name: r.name.clone(),
            url: r.url.clone().unwrap_or_default(),
            order_no: r.order_no,
        }
    }

    pub fn to_write_request(&self) -> MenuWriteRequest {
        let url = self.url.trim();
        MenuWriteRequest {
            // Always explicit: Some(id) or a wire-level null. Omission never
            // means "leave unchanged".
            parent_id: self.parent_id,
            name: self.name.trim().to_string(),
            url: if url.is_empty() {
                None
            } else {
                Some(url.to_string())
            },
            order_no: self.order_no,
        }
    }
}

/// Local field validation shared by the session and the store. Runs before
/// any network call.
pub(crate) fn validate_fields(d: &MenuDraft) -> Result<(), StoreError> {
    if d.name.trim().is_empty() {
        return Err(StoreError::validation("Menu name is required"));
    }
    if d.order_no < 0 {
        return Err(StoreError::validation("Order must be zero or positive"));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EditMode {
    Add,
    Edit,
}

/// One in-flight add/edit interaction.
///
/// `Idle -> Composing -> Submitting -> Idle` on success; a validation or
/// write failure lands back in `Composing` with the error attached and the
/// draft intact, so the operator corrects and resubmits instead of
/// re-entering everything.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EditSession {
    Idle,
    Composing {
        mode: EditMode,
        /// The record being edited; `None` in add mode.
        target: Option<MenuId>,
        draft: MenuDraft,
        error: Option<String>,
    },
    Submitting {
        mode: EditMode,
        target: Option<MenuId>,
        draft: MenuDraft,
    },
}

impl EditSession {
    pub fn begin_add(&mut self, parent_id: Option<MenuId>) {
        *self = EditSession::Composing {
            mode: EditMode::Add,
            target: None,
            draft: MenuDraft {
                parent_id,
                ..MenuDraft::default()
            },
            error: None,
        };
    }

    pub fn begin_edit(&mut self, record: &MenuRecord) {
        *self = EditSession::Composing {
            mode: EditMode::Edit,
            target: Some(record.id),
            draft: MenuDraft::from_record(record),
            error: None,
        };
    }

    /// Pure field update; a no-op outside `Composing`.
    pub fn update_draft(&mut self, f: impl FnOnce(&mut MenuDraft)) {
        if let EditSession::Composing { draft, .. } = self {
            f(draft);
        }
    }

    /// Validate and move to `Submitting`, handing the caller what to send.
    ///
    /// Returns `None` when there is nothing to submit: the session is idle,
    /// a submit is already in flight (no double submit), or validation
    /// failed, in which case the error is attached and no network call may
    /// be made.
    pub fn begin_submit(&mut self) -> Option<(EditMode, Option<MenuId>, MenuDraft)> {
        let EditSession::Composing {
            mode,
            target,
            draft,
            error,
        } = self
        else {
            return None;
        };

        if let Err(e) = validate_fields(draft) {
            *error = Some(e.to_string());
            return None;
        }

        let out = (*mode, *target, draft.clone());
        *self = EditSession::Submitting {
            mode: out.0,
            target: out.1,
            draft: out.2.clone(),
        };
        Some(out)
    }

    /// Store call failed: back to `Composing`, draft retained.
    pub fn fail_submit(&mut self, message: impl Into<String>) {
        if let EditSession::Submitting {
            mode,
            target,
            draft,
        } = self
        {
            *self = EditSession::Composing {
                mode: *mode,
                target: *target,
                draft: draft.clone(),
                error: Some(message.into()),
            };
        }
    }

    pub fn finish_submit(&mut self) {
        *self = EditSession::Idle;
    }

    /// Discard the draft unconditionally, from any state.
    pub fn cancel(&mut self) {
        *self = EditSession::Idle;
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, EditSession::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, EditSession::Submitting { .. })
    }

    pub fn mode(&self) -> Option<EditMode> {
        match self {
            EditSession::Idle => None,
            EditSession::Composing { mode, .. } | EditSession::Submitting { mode, .. } => {
                Some(*mode)
            }
        }
    }

    /// Id of the record being edited (drives the tree's active highlight).
    pub fn target(&self) -> Option<MenuId> {
        match self {
            EditSession::Idle => None,
            EditSession::Composing { target, .. } | EditSession::Submitting { target, .. } => {
                *target
            }
        }
    }

    pub fn draft(&self) -> Option<&MenuDraft> {
        match self {
            EditSession::Idle => None,
            EditSession::Composing { draft, .. } | EditSession::Submitting { draft, .. } => {
                Some(draft)
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EditSession::Composing { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

impl Default for EditSession {
    fn default() -> Self {
        EditSession::Idle
    }
}
