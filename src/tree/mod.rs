use crate::models::{find_menu, MenuId, MenuRecord};
use crate::state::menu_store::StorePhase;
use crate::state::{AppContext, MenuUiActions};
use leptos::prelude::*;
use std::collections::HashMap;

/// Per-node presentation state, kept in a side-table keyed by id so the
/// canonical forest never carries view concerns.
///
/// Nodes default to expanded on first appearance; collapsing only hides a
/// subtree from the rendered sequence, the data stays in the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TreeView {
    expanded: HashMap<MenuId, bool>,

    /// The node currently open for editing, for row highlighting. At most
    /// one; owned by the edit-session lifecycle.
    pub active_id: Option<MenuId>,
}

impl TreeView {
    pub fn is_expanded(&self, id: MenuId) -> bool {
        self.expanded.get(&id).copied().unwrap_or(true)
    }

    /// Flip one node; siblings and ancestors are untouched.
    pub fn toggle(&mut self, id: MenuId) {
        let next = !self.is_expanded(id);
        self.expanded.insert(id, next);
    }

    pub fn set_active(&mut self, id: MenuId) {
        self.active_id = Some(id);
    }

    pub fn clear_active(&mut self) {
        self.active_id = None;
    }

    /// Depth-first pre-order ids, honoring each node's expanded flag.
    /// Recomputed from current state on every call.
    pub fn visible_preorder(&self, forest: &[MenuRecord]) -> Vec<MenuId> {
        fn collect(view: &TreeView, nodes: &[MenuRecord], out: &mut Vec<MenuId>) {
            for n in nodes {
                out.push(n.id);
                if view.is_expanded(n.id) {
                    collect(view, &n.children, out);
                }
            }
        }

        let mut out = vec![];
        collect(self, forest, &mut out);
        out
    }
}

#[component]
pub fn MenuTree(view: RwSignal<TreeView>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let forest = app_state.0.store.forest;

    view! {
        {move || {
            let roots = forest.get();
            if roots.is_empty() {
                view! { <div class="text-xs text-muted-foreground">"No menus yet."</div> }
                    .into_any()
            } else {
                let root_ids_sv =
                    StoredValue::new(roots.iter().map(|n| n.id).collect::<Vec<MenuId>>());

                view! {
                    <ul class="space-y-0.5">
                        <For
                            each=move || root_ids_sv.get_value()
                            key=|id| *id
                            children=move |id| {
                                view! { <MenuNode id=id depth=0 view=view /> }
                            }
                        />
                    </ul>
                }
                .into_any()
            }
        }}
    }
}

#[component]
pub fn MenuNode(id: MenuId, depth: usize, view: RwSignal<TreeView>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let actions = expect_context::<MenuUiActions>();

    let forest = app_state.0.store.forest;
    let phase = app_state.0.store.phase;
    let busy = move || phase.get() != StorePhase::Ready;

    let node = move || find_menu(&forest.get(), id).cloned();
    let indent_px = (depth * 18) as i32;

    view! {
        <li>
            {move || {
                let Some(n) = node() else {
                    return ().into_view().into_any();
                };

                let has_kids = !n.children.is_empty();
                let expanded = view.get().is_expanded(id);
                let is_active = view.get().active_id == Some(id);

                let (bullet, bullet_class) = if has_kids {
                    (
                        if expanded { "▾" } else { "▸" },
                        "h-5 w-5 text-base leading-none text-muted-foreground cursor-pointer hover:text-foreground/80",
                    )
                } else {
                    ("•", "h-5 w-5 text-base leading-none text-muted-foreground")
                };

                let row_class = if is_active {
                    "group flex items-center gap-2 rounded-md py-1 pr-1 bg-primary/10 ring-1 ring-primary/30"
                } else {
                    "group flex items-center gap-2 rounded-md py-1 pr-1 hover:bg-accent/50"
                };

                let children_view = if expanded && has_kids {
                    let kid_ids_sv =
                        StoredValue::new(n.children.iter().map(|c| c.id).collect::<Vec<MenuId>>());

                    view! {
                        <ul class="space-y-0.5">
                            <For
                                each=move || kid_ids_sv.get_value()
                                key=|id| *id
                                children=move |id| {
                                    view! { <MenuNode id=id depth=depth + 1 view=view /> }
                                }
                            />
                        </ul>
                    }
                    .into_any()
                } else {
                    ().into_view().into_any()
                };

                let name = n.name.clone();
                let url_hint = n.url.clone();

                view! {
                    <div style=format!("padding-left: {indent_px}px")>
                        <div class=row_class>
                            <button
                                class=bullet_class
                                disabled=!has_kids
                                title=move || if has_kids {
                                    if expanded { "Collapse" } else { "Expand" }
                                } else {
                                    ""
                                }
                                on:click=move |_| view.update(|v| v.toggle(id))
                            >
                                {bullet}
                            </button>

                            <span class="min-w-0 flex-1 truncate text-sm">
                                {name}
                                {url_hint.map(|u| view! {
                                    <span class="ml-2 text-xs text-muted-foreground">{u}</span>
                                })}
                            </span>

                            <div class="flex shrink-0 items-center gap-1 opacity-100 md:opacity-0 md:group-hover:opacity-100">
                                <button
                                    class="rounded px-1.5 py-0.5 text-xs text-muted-foreground hover:bg-accent hover:text-accent-foreground"
                                    title="Add child menu"
                                    disabled=busy
                                    on:click=move |_| actions.open_add_child.run(id)
                                >
                                    "+"
                                </button>
                                <button
                                    class="rounded px-1.5 py-0.5 text-xs text-muted-foreground hover:bg-accent hover:text-accent-foreground"
                                    title="Edit menu"
                                    disabled=busy
                                    on:click=move |_| actions.open_edit.run(id)
                                >
                                    "Edit"
                                </button>
                                <button
                                    class="rounded px-1.5 py-0.5 text-xs text-destructive hover:bg-destructive/10"
                                    title="Delete menu"
                                    disabled=busy
                                    on:click=move |_| actions.request_delete.run(id)
                                >
                                    "Delete"
                                </button>
                            </div>
                        </div>

                        {children_view}
                    </div>
                }
                .into_any()
            }}
        </li>
    }
}
