use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardTitle, Label, Spinner,
};
use crate::models::{find_menu, parent_choices, MenuId, MenuRecord};
use crate::session::{EditMode, EditSession, MenuDraft};
use crate::state::menu_store::StorePhase;
use crate::state::{AppContext, ConfirmPort, MenuUiActions};
use crate::tree::{MenuTree, TreeView};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn count_nodes(forest: &[MenuRecord]) -> usize {
    forest.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}

#[component]
pub fn MenuManagerPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let confirm = expect_context::<ConfirmPort>();
    let store = app_state.0.store;

    let tree_view: RwSignal<TreeView> = RwSignal::new(TreeView::default());
    let session: RwSignal<EditSession> = RwSignal::new(EditSession::Idle);

    // Delete failures land in the page banner; load failures come through
    // the store's own error signal.
    let delete_error: RwSignal<Option<String>> = RwSignal::new(None);

    let loading = move || store.phase.get() == StorePhase::Loading;
    let busy = move || store.phase.get() != StorePhase::Ready;

    let load_menus = move || {
        spawn_local(async move {
            store.load().await;
        });
    };

    // Initial load. Refresh re-runs it explicitly; loads are sequence-tagged
    // in the store, so an overlapping pair resolves last-completion-wins.
    Effect::new(move |_| {
        if store.phase.get_untracked() == StorePhase::Empty {
            load_menus();
        }
    });

    let open_add_root = move |()| {
        session.update(|s| s.begin_add(None));
        tree_view.update(|v| v.clear_active());
    };

    let open_add_child = move |parent: MenuId| {
        session.update(|s| s.begin_add(Some(parent)));
        tree_view.update(|v| v.clear_active());
    };

    let open_edit = move |id: MenuId| {
        let forest = store.forest.get_untracked();
        let Some(record) = find_menu(&forest, id) else {
            return;
        };
        session.update(|s| s.begin_edit(record));
        tree_view.update(|v| v.set_active(id));
    };

    let request_delete = move |id: MenuId| {
        if !store.can_mutate() {
            return;
        }
        let forest = store.forest.get_untracked();
        let Some(record) = find_menu(&forest, id) else {
            return;
        };

        if !confirm.ask(format!("Delete menu \"{}\"?", record.name)) {
            return;
        }

        delete_error.set(None);
        spawn_local(async move {
            // One DELETE; the store reloads on success and leaves the
            // forest untouched on failure.
            if let Err(e) = store.remove(id).await {
                delete_error.set(Some(e.to_string()));
            }
        });
    };

    provide_context(MenuUiActions {
        open_add_root: Callback::new(open_add_root),
        open_add_child: Callback::new(open_add_child),
        open_edit: Callback::new(open_edit),
        request_delete: Callback::new(request_delete),
    });

    let on_submit = move |_: web_sys::MouseEvent| {
        let mut handoff: Option<(EditMode, Option<MenuId>, MenuDraft)> = None;
        session.update(|s| handoff = s.begin_submit());

        // None: validation failed (error already attached), a submit is
        // already in flight, or there is no open session.
        let Some((mode, target, draft)) = handoff else {
            return;
        };

        spawn_local(async move {
            let result = match (mode, target) {
                (EditMode::Edit, Some(id)) => store.update(id, &draft).await,
                _ => store.create(&draft).await,
            };

            match result {
                Ok(()) => {
                    session.update(|s| s.finish_submit());
                    tree_view.update(|v| v.clear_active());
                }
                Err(e) => session.update(|s| s.fail_submit(e.to_string())),
            }
        });
    };

    let on_cancel = move |_: web_sys::MouseEvent| {
        session.update(|s| s.cancel());
        tree_view.update(|v| v.clear_active());
    };

    let banner_error = move || store.error.get().or_else(|| delete_error.get());

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[1080px] px-4 py-8">
                <div class="mb-4 flex items-center justify-between">
                    <div class="space-y-1">
                        <h1 class="text-xl font-semibold">"Menuboard"</h1>
                        <p class="text-xs text-muted-foreground">"Navigation menus"</p>
                    </div>

                    <div class="flex items-center gap-2">
                        <Button
                            variant=ButtonVariant::Outline
                            attr:disabled=loading
                            on:click=move |_| load_menus()
                        >
                            <span class="inline-flex items-center gap-2">
                                <Show when=loading fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if loading() { "Refreshing" } else { "Refresh" }}
                            </span>
                        </Button>

                        <Button attr:disabled=busy on:click=move |_| open_add_root(())>
                            "Add root menu"
                        </Button>
                    </div>
                </div>

                <Show when=move || banner_error().is_some() fallback=|| ().into_view()>
                    {move || banner_error().map(|e| view! {
                        <Alert class="mb-4 border-destructive/30">
                            <AlertDescription class="text-destructive">{e}</AlertDescription>
                        </Alert>
                    })}
                </Show>

                <Card>
                    <CardHeader>
                        <CardTitle>"Menu tree"</CardTitle>
                        <CardDescription>
                            {move || {
                                let forest = store.forest.get();
                                let total = count_nodes(&forest);
                                let visible = tree_view.get().visible_preorder(&forest).len();
                                format!("{total} total, {visible} visible")
                            }}
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        <Show
                            when=move || !store.forest.get().is_empty()
                            fallback=move || view! {
                                <div class="text-xs text-muted-foreground">
                                    {move || if loading() {
                                        "Loading menus..."
                                    } else {
                                        "No menus yet."
                                    }}
                                </div>
                            }
                        >
                            <MenuTree view=tree_view />
                        </Show>
                    </CardContent>
                </Card>

                <Show when=move || session.with(|s| s.is_open()) fallback=|| ().into_view()>
                    <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                        <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                            <div class="mb-3 space-y-1">
                                <div class="text-sm font-medium">
                                    {move || match session.with(|s| s.mode()) {
                                        Some(EditMode::Edit) => "Edit menu",
                                        _ => "New menu",
                                    }}
                                </div>
                                <div class="text-xs text-muted-foreground">
                                    "Leave the parent empty to keep the menu at root level."
                                </div>
                            </div>

                            <div class="space-y-2">
                                <div class="space-y-1">
                                    <Label class="text-xs" html_for="menu-parent">"Parent"</Label>
                                    <select
                                        id="menu-parent"
                                        class="h-8 w-full rounded-md border border-input bg-transparent px-2 text-sm outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50"
                                        on:change=move |ev| {
                                            let v = event_target_value(&ev);
                                            let parent = v.parse::<MenuId>().ok();
                                            session.update(|s| s.update_draft(|d| d.parent_id = parent));
                                        }
                                    >
                                        <option value="">"No parent"</option>
                                        {move || {
                                            // The node being edited and its whole subtree are
                                            // excluded, so no picker choice can form a cycle.
                                            let forest = store.forest.get();
                                            let exclude = session.with(|s| s.target());
                                            let current = session.with(|s| s.draft().and_then(|d| d.parent_id));

                                            parent_choices(&forest, exclude)
                                                .into_iter()
                                                .map(|c| {
                                                    let label = format!("{}{}", "\u{00A0}\u{00A0}".repeat(c.depth), c.name);
                                                    view! {
                                                        <option value=c.id.to_string() selected={current == Some(c.id)}>
                                                            {label}
                                                        </option>
                                                    }
                                                })
                                                .collect_view()
                                        }}
                                    </select>
                                </div>

                                <div class="space-y-1">
                                    <Label class="text-xs" html_for="menu-name">"Name"</Label>
                                    <input
                                        id="menu-name"
                                        type="text"
                                        class="h-8 w-full rounded-md border border-input bg-transparent px-3 text-sm outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50"
                                        prop:value=move || session.with(|s| {
                                            s.draft().map(|d| d.name.clone()).unwrap_or_default()
                                        })
                                        on:input=move |ev| {
                                            let v = event_target_value(&ev);
                                            session.update(|s| s.update_draft(|d| d.name = v));
                                        }
                                    />
                                </div>

                                <div class="space-y-1">
                                    <Label class="text-xs" html_for="menu-url">"URL (optional)"</Label>
                                    <input
                                        id="menu-url"
                                        type="text"
                                        placeholder="/section/page"
                                        class="h-8 w-full rounded-md border border-input bg-transparent px-3 text-sm outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50"
                                        prop:value=move || session.with(|s| {
                                            s.draft().map(|d| d.url.clone()).unwrap_or_default()
                                        })
                                        on:input=move |ev| {
                                            let v = event_target_value(&ev);
                                            session.update(|s| s.update_draft(|d| d.url = v));
                                        }
                                    />
                                </div>

                                <div class="space-y-1">
                                    <Label class="text-xs" html_for="menu-order">"Order"</Label>
                                    <input
                                        id="menu-order"
                                        type="number"
                                        min="0"
                                        class="h-8 w-full rounded-md border border-input bg-transparent px-3 text-sm outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50"
                                        prop:value=move || session.with(|s| {
                                            s.draft().map(|d| d.order_no.to_string()).unwrap_or_default()
                                        })
                                        on:input=move |ev| {
                                            let v = event_target_value(&ev);
                                            let order = v.trim().parse::<i64>().unwrap_or_default();
                                            session.update(|s| s.update_draft(|d| d.order_no = order));
                                        }
                                    />
                                </div>

                                <Show
                                    when=move || session.with(|s| s.error().is_some())
                                    fallback=|| ().into_view()
                                >
                                    {move || session.with(|s| s.error().map(String::from)).map(|e| view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                        </Alert>
                                    })}
                                </Show>

                                <div class="flex items-center justify-end gap-2 pt-2">
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        attr:disabled=move || session.with(|s| s.is_submitting())
                                        on:click=on_cancel
                                    >
                                        "Cancel"
                                    </Button>
                                    <Button
                                        size=ButtonSize::Sm
                                        attr:disabled=move || session.with(|s| s.is_submitting())
                                        on:click=on_submit
                                    >
                                        <span class="inline-flex items-center gap-2">
                                            <Show
                                                when=move || session.with(|s| s.is_submitting())
                                                fallback=|| ().into_view()
                                            >
                                                <Spinner />
                                            </Show>
                                            {move || {
                                                if session.with(|s| s.is_submitting()) {
                                                    "Saving..."
                                                } else {
                                                    match session.with(|s| s.mode()) {
                                                        Some(EditMode::Edit) => "Save",
                                                        _ => "Add",
                                                    }
                                                }
                                            }}
                                        </span>
                                    </Button>
                                </div>
                            </div>
                        </div>
                    </div>
                </Show>
            </div>
        </div>
    }
}
