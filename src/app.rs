use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::reactive::owner::LocalStorage;
use leptos::task::spawn_local;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use web_sys::{HtmlElement, HtmlInputElement, HtmlSelectElement};

use crate::autosave::Ticket;
use crate::config::Theme;
use crate::export::PdfRenderer;
use crate::mutator::EditCommand;
use crate::notes::{NoteId, NoteSummary};
use crate::session::{HostAction, NoteSession};
use crate::shortcuts::shortcut_for;
use crate::status::{StatusKind, StatusMessage};
use crate::web::{self, BrowserClock, BrowserStore, DomSurface, Html2Pdf};

type BrowserSession = NoteSession<DomSurface, BrowserStore, BrowserClock>;

const SPECIAL_CHARACTERS: [&str; 24] = [
    "©", "®", "™", "€", "£", "¥", "¢", "§", "¶", "←", "→", "↑", "↓", "•", "∞", "≈", "≠", "≤",
    "≥", "±", "µ", "π", "Ω", "°",
];

/// Snapshot of what the shell renders, refreshed after every session call.
#[derive(Clone, Debug, Default, PartialEq)]
struct ViewState {
    notes: Vec<NoteSummary>,
    current: Option<NoteId>,
    title: String,
    pinned: bool,
    theme: Theme,
    stats: String,
    note_count: usize,
    last_saved: Option<String>,
    status: Option<StatusMessage>,
    can_undo: bool,
    can_redo: bool,
    print_delay: Duration,
}

impl ViewState {
    fn of(session: &BrowserSession) -> Self {
        Self {
            notes: session.note_list(),
            current: session.current_id().cloned(),
            title: session.title().to_string(),
            pinned: session.is_pinned(),
            theme: session.theme(),
            stats: session.stats().to_string(),
            note_count: session.note_count(),
            last_saved: session.last_saved().map(str::to_owned),
            status: session.status().cloned(),
            can_undo: session.can_undo(),
            can_redo: session.can_redo(),
            print_delay: session.settings().print_delay(),
        }
    }
}

#[derive(Default)]
struct Timers {
    save: Option<TimeoutHandle>,
    status: Option<TimeoutHandle>,
}

#[derive(Clone, Copy)]
struct Editor {
    session: StoredValue<Rc<RefCell<Option<BrowserSession>>>, LocalStorage>,
    timers: StoredValue<Timers, LocalStorage>,
    state: RwSignal<ViewState>,
    find_open: RwSignal<bool>,
    chars_open: RwSignal<bool>,
    file_input: NodeRef<html::Input>,
}

impl Editor {
    fn new() -> Self {
        Self {
            session: StoredValue::new_local(Rc::new(RefCell::new(None))),
            timers: StoredValue::new_local(Timers::default()),
            state: RwSignal::new(ViewState::default()),
            find_open: RwSignal::new(false),
            chars_open: RwSignal::new(false),
            file_input: NodeRef::new(),
        }
    }

    fn is_started(self) -> bool {
        self.session.with_value(|cell| cell.borrow().is_some())
    }

    fn start(self, element: HtmlElement) {
        let store = BrowserStore::open();
        let persistent = store.is_persistent();
        let session = NoteSession::start(store, DomSurface::new(element), BrowserClock);
        self.session.with_value(|cell| *cell.borrow_mut() = Some(session));
        tracing::info!(persistent, "editor started");
        self.run(|_| ());
    }

    /// Runs `action` against the session, then refreshes the view and arms
    /// any timers the session asked for.
    fn run<R>(self, action: impl FnOnce(&mut BrowserSession) -> R) -> Option<R> {
        let cell = self.session.get_value();
        // execCommand fires `input` synchronously while the session is busy.
        let Ok(mut slot) = cell.try_borrow_mut() else {
            return None;
        };
        let session = slot.as_mut()?;
        let out = action(session);
        let state = ViewState::of(session);
        let save = session.take_scheduled_save();
        let status = session.take_status_timer();
        drop(slot);

        self.state.set(state);
        if let Some((ticket, delay)) = save {
            self.arm_save(ticket, delay);
        }
        if let Some((generation, delay)) = status {
            self.arm_status(generation, delay);
        }
        Some(out)
    }

    fn arm_save(self, ticket: Ticket, delay: Duration) {
        let handle = set_timeout_with_handle(
            move || {
                self.run(|s| s.autosave_elapsed(ticket));
            },
            delay,
        )
        .ok();
        self.timers.update_value(|timers| {
            if let Some(previous) = std::mem::replace(&mut timers.save, handle) {
                previous.clear();
            }
        });
    }

    fn arm_status(self, generation: u64, delay: Duration) {
        let handle = set_timeout_with_handle(
            move || {
                self.run(|s| s.dismiss_status(generation));
            },
            delay,
        )
        .ok();
        self.timers.update_value(|timers| {
            if let Some(previous) = std::mem::replace(&mut timers.status, handle) {
                previous.clear();
            }
        });
    }

    fn apply(self, command: EditCommand) {
        self.run(|s| s.apply(command));
    }

    /// Applies the chosen option, then puts the select back on its
    /// placeholder so picking the same option again still fires.
    fn apply_select(self, e: &ev::Event) {
        let select: HtmlSelectElement = event_target(e);
        if let Some(command) = EditCommand::from_select_value(&select.value()) {
            self.apply(command);
        }
        select.set_selected_index(0);
    }

    fn perform(self, action: HostAction) {
        match action {
            HostAction::OpenFile => {
                if let Some(input) = self.file_input.get_untracked() {
                    input.click();
                }
            }
            HostAction::Print => {
                let delay = self.state.with_untracked(|s| s.print_delay);
                set_timeout(
                    || {
                        if let Err(err) = window().print() {
                            tracing::warn!(err = %web::js_error(&err), "print failed");
                        }
                    },
                    delay,
                );
            }
            HostAction::OpenFind => self.find_open.set(true),
        }
    }

    fn insert_link(self) {
        self.run(|s| s.capture_selection());
        let url = window()
            .prompt_with_message_and_default("Enter the link URL:", "http://")
            .ok()
            .flatten();
        self.apply(EditCommand::Link(url));
    }

    fn delete_note(self) {
        let confirmed = window()
            .confirm_with_message("Delete this note?")
            .unwrap_or(false);
        self.run(|s| s.delete_current(confirmed));
    }

    fn native_clipboard(self, command: &'static str) {
        self.run(|s| {
            s.restore_selection();
            s.surface().clipboard_command(command);
            s.content_changed();
        });
    }

    fn paste(self) {
        spawn_local(async move {
            let clipboard = web::read_clipboard().await;
            self.run(|s| s.paste(clipboard));
        });
    }

    fn export_pdf(self) {
        let Some(job) = self.run(|s| s.begin_pdf_export()).flatten() else {
            return;
        };
        spawn_local(async move {
            let result = Html2Pdf.render(job).await;
            self.run(|s| s.finish_pdf_export(result));
        });
    }

    fn import(self, file: web_sys::File) {
        spawn_local(async move {
            match web::read_file_text(&file).await {
                Ok(raw) => {
                    self.run(|s| s.import_file(&file.name(), &raw));
                }
                Err(err) => {
                    self.run(|s| s.import_failed(&err));
                }
            }
        });
    }
}

fn status_class(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Info => "status status-info",
        StatusKind::Success => "status status-success",
        StatusKind::Error => "status status-error",
    }
}

#[component]
pub fn App() -> impl IntoView {
    let editor = Editor::new();
    let editor_ref = NodeRef::<html::Div>::new();
    let (find_text, set_find_text) = signal(String::new());
    let (replace_text, set_replace_text) = signal(String::new());

    Effect::new(move |_| {
        let Some(div) = editor_ref.get() else {
            return;
        };
        if !editor.is_started() {
            editor.start(div.into());
        }
    });

    Effect::new(move |_| {
        let theme = editor.state.with(|s| s.theme);
        if let Some(root) = document().document_element() {
            let _ = root.set_attribute("data-theme", theme.as_str());
        }
    });

    let _shortcuts = window_event_listener(ev::keydown, move |e| {
        let Some(shortcut) = shortcut_for(&e.key(), e.ctrl_key(), e.meta_key()) else {
            return;
        };
        e.prevent_default();
        if let Some(action) = editor.run(|s| s.run_shortcut(shortcut)).flatten() {
            editor.perform(action);
        }
    });

    let file_input = editor.file_input;
    let on_file_picked = move |e: ev::Event| {
        let input: HtmlInputElement = event_target(&e);
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        input.set_value("");
        editor.import(file);
    };

    let note_list = move || {
        let current = editor.state.with(|s| s.current.clone());
        editor
            .state
            .with(|s| s.notes.clone())
            .into_iter()
            .map(|note| {
                let active = current.as_ref() == Some(&note.id);
                let id = note.id.clone();
                view! {
                    <div
                        class="note-item"
                        class:active=active
                        on:click=move |_| {
                            editor.run(|s| s.load_note(&id));
                        }
                    >
                        <div class="note-title">{note.pinned.then_some("📌 ")}{note.title}</div>
                        <div class="note-preview">{note.preview}</div>
                    </div>
                }
            })
            .collect_view()
    };

    let special_characters = move || {
        SPECIAL_CHARACTERS
            .iter()
            .map(|&ch| {
            view! {
                <button
                    class="char-button"
                    on:click=move |_| {
                        editor.chars_open.set(false);
                        editor.apply(EditCommand::InsertText(ch.to_string()));
                    }
                >
                    {ch}
                </button>
            }
            })
            .collect_view()
    };

    view! {
        <style>{STYLES}</style>
        <main class="app-layout">
            <nav class="menubar" on:mousedown=|e| e.prevent_default()>
                <div class="menu">
                    <span class="menu-label">"File"</span>
                    <button on:click=move |_| { editor.run(|s| s.create_note(None)); }>"New"</button>
                    <button on:click=move |_| editor.perform(HostAction::OpenFile)>"Open"</button>
                    <button on:click=move |_| { editor.run(|s| s.save_now()); }>"Save"</button>
                    <button on:click=move |_| editor.perform(HostAction::Print)>"Print"</button>
                    <button on:click=move |_| editor.export_pdf()>"Export PDF"</button>
                    <button on:click=move |_| editor.delete_note()>"Delete"</button>
                </div>
                <div class="menu">
                    <span class="menu-label">"Edit"</span>
                    <button on:click=move |_| { editor.run(|s| s.undo()); }
                        prop:disabled=move || !editor.state.with(|s| s.can_undo)>"Undo"</button>
                    <button on:click=move |_| { editor.run(|s| s.redo()); }
                        prop:disabled=move || !editor.state.with(|s| s.can_redo)>"Redo"</button>
                    <button on:click=move |_| editor.native_clipboard("cut")>"Cut"</button>
                    <button on:click=move |_| editor.native_clipboard("copy")>"Copy"</button>
                    <button on:click=move |_| editor.paste()>"Paste"</button>
                    <button on:click=move |_| { editor.run(|s| s.select_all()); }>"Select All"</button>
                    <button on:click=move |_| {
                        editor.run(|s| s.capture_selection());
                        editor.find_open.set(true);
                    }>"Find & Replace"</button>
                </div>
                <div class="menu">
                    <span class="menu-label">"Insert"</span>
                    <button on:click=move |_| { editor.run(|s| s.insert_date()); }>"Date"</button>
                    <button on:click=move |_| editor.insert_link()>"Link"</button>
                    <button on:click=move |_| editor.chars_open.set(true)>"Special Character"</button>
                    <button on:click=move |_| editor.apply(EditCommand::non_breaking_space())>"Non-breaking Space"</button>
                </div>
                <div class="menu">
                    <span class="menu-label">"View"</span>
                    <button on:click=move |_| { editor.run(|s| s.toggle_theme()); }>
                        {move || match editor.state.with(|s| s.theme) {
                            Theme::Light => "Dark Mode",
                            Theme::Dark => "Light Mode",
                        }}
                    </button>
                </div>
            </nav>

            <div class="toolbar" on:mousedown=|e| {
                if !matches!(event_target::<web_sys::Element>(&e).tag_name().as_str(), "SELECT" | "OPTION") {
                    e.prevent_default();
                }
            }>
                <button class="format-button" title="Bold" on:click=move |_| editor.apply(EditCommand::Bold)><b>"B"</b></button>
                <button class="format-button" title="Italic" on:click=move |_| editor.apply(EditCommand::Italic)><i>"I"</i></button>
                <button class="format-button" title="Underline" on:click=move |_| editor.apply(EditCommand::Underline)><u>"U"</u></button>
                <select
                    title="Alignment"
                    on:focus=move |_| { editor.run(|s| s.capture_selection()); }
                    on:change=move |e| editor.apply_select(&e)
                >
                    <option value="" disabled selected>"Align"</option>
                    <option value="justifyLeft">"Left"</option>
                    <option value="justifyCenter">"Center"</option>
                    <option value="justifyRight">"Right"</option>
                </select>
                <select
                    title="Font size"
                    on:focus=move |_| { editor.run(|s| s.capture_selection()); }
                    on:change=move |e| editor.apply_select(&e)
                >
                    <option value="" disabled selected>"Size"</option>
                    <option value="1">"Tiny"</option>
                    <option value="2">"Small"</option>
                    <option value="3">"Normal"</option>
                    <option value="4">"Medium"</option>
                    <option value="5">"Large"</option>
                    <option value="6">"X-Large"</option>
                    <option value="7">"Huge"</option>
                </select>
            </div>

            <div class="workspace">
                <aside class="sidebar">
                    <input
                        class="search"
                        type="search"
                        placeholder="Search notes..."
                        on:input=move |e| {
                            let term = event_target_value(&e);
                            editor.run(|s| s.set_search(&term));
                        }
                    />
                    <div class="note-list">{note_list}</div>
                    <div class="note-count">
                        {move || format!("{} notes", editor.state.with(|s| s.note_count))}
                    </div>
                </aside>

                <section class="editor-pane">
                    <header class="title-bar">
                        <input
                            class="title-input"
                            placeholder="Note title"
                            prop:value=move || editor.state.with(|s| s.title.clone())
                            on:input=move |e| {
                                let title = event_target_value(&e);
                                editor.run(|s| s.set_title(&title));
                            }
                        />
                        <button on:click=move |_| { editor.run(|s| s.toggle_pin()); }>
                            {move || if editor.state.with(|s| s.pinned) { "Unpin" } else { "Pin" }}
                        </button>
                    </header>
                    <div
                        class="editor"
                        contenteditable="true"
                        spellcheck="true"
                        node_ref=editor_ref
                        on:input=move |_| {
                            editor.run(|s| s.content_changed());
                        }
                        on:keyup=move |e: ev::KeyboardEvent| {
                            let key = e.key();
                            editor.run(|s| {
                                if key == " " || key == "Enter" {
                                    s.typing_boundary();
                                }
                                s.capture_selection();
                            });
                        }
                        on:mouseup=move |_| {
                            editor.run(|s| s.capture_selection());
                        }
                    ></div>
                    <footer class="status-bar">
                        <span>{move || editor.state.with(|s| s.stats.clone())}</span>
                        <span>
                            {move || {
                                editor
                                    .state
                                    .with(|s| s.last_saved.clone())
                                    .map(|time| format!("Last saved: {time}"))
                            }}
                        </span>
                    </footer>
                </section>
            </div>

            <input
                type="file"
                accept=".txt,.md,.markdown,.html,text/*"
                style="display: none;"
                node_ref=file_input
                on:change=on_file_picked
            />

            <Show when=move || editor.find_open.get()>
                <div class="modal">
                    <div class="modal-body">
                        <h3>"Find & Replace"</h3>
                        <input
                            placeholder="Find"
                            prop:value=find_text
                            on:input=move |e| set_find_text.set(event_target_value(&e))
                        />
                        <input
                            placeholder="Replace with"
                            prop:value=replace_text
                            on:input=move |e| set_replace_text.set(event_target_value(&e))
                        />
                        <div class="modal-actions">
                            <button on:click=move |_| {
                                let (find, replacement) = (find_text.get_untracked(), replace_text.get_untracked());
                                editor.run(|s| s.replace_first(&find, &replacement));
                            }>"Replace"</button>
                            <button on:click=move |_| {
                                let (find, replacement) = (find_text.get_untracked(), replace_text.get_untracked());
                                editor.run(|s| s.replace_all(&find, &replacement));
                            }>"Replace All"</button>
                            <button on:click=move |_| editor.find_open.set(false)>"Close"</button>
                        </div>
                    </div>
                </div>
            </Show>

            <Show when=move || editor.chars_open.get()>
                <div class="modal">
                    <div class="modal-body">
                        <h3>"Special Characters"</h3>
                        <div class="char-grid" on:mousedown=|e| e.prevent_default()>
                            {special_characters}
                        </div>
                        <div class="modal-actions">
                            <button on:click=move |_| editor.chars_open.set(false)>"Close"</button>
                        </div>
                    </div>
                </div>
            </Show>

            {move || {
                editor
                    .state
                    .with(|s| s.status.clone())
                    .map(|msg| view! { <div class=status_class(msg.kind)>{msg.text}</div> })
            }}
        </main>
    }
}

const STYLES: &str = r#"
:root {
    --bg-primary: #ffffff;
    --bg-secondary: #f4f5f7;
    --text-primary: #1a1a1a;
    --text-muted: #6b7280;
    --border-color: #e5e7eb;
    --accent-color: #6366f1;
}
[data-theme="dark"] {
    --bg-primary: #1e1e2e;
    --bg-secondary: #181825;
    --text-primary: #e5e7eb;
    --text-muted: #9ca3af;
    --border-color: #313244;
}
body { margin: 0; font-family: system-ui, sans-serif; }
.app-layout { display: flex; flex-direction: column; height: 100vh; background: var(--bg-primary); color: var(--text-primary); }
.menubar, .toolbar { display: flex; gap: 1rem; padding: 0.4rem 1rem; border-bottom: 1px solid var(--border-color); background: var(--bg-secondary); flex-wrap: wrap; }
.menu { display: flex; gap: 0.25rem; align-items: center; }
.menu-label { font-weight: 600; margin-right: 0.25rem; }
.workspace { flex: 1; display: flex; min-height: 0; }
.sidebar { width: 260px; border-right: 1px solid var(--border-color); display: flex; flex-direction: column; background: var(--bg-secondary); }
.search { margin: 0.75rem; padding: 0.4rem; }
.note-list { flex: 1; overflow-y: auto; padding: 0 0.5rem; }
.note-item { padding: 0.5rem 0.75rem; border-radius: 6px; cursor: pointer; margin-bottom: 4px; }
.note-item.active { background: var(--accent-color); color: white; }
.note-title { font-weight: 600; }
.note-preview { font-size: 0.8rem; opacity: 0.75; white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
.note-count { padding: 0.5rem 0.75rem; font-size: 0.8rem; color: var(--text-muted); }
.editor-pane { flex: 1; display: flex; flex-direction: column; min-width: 0; }
.title-bar { display: flex; gap: 0.5rem; padding: 0.75rem 1.5rem; border-bottom: 1px solid var(--border-color); }
.title-input { flex: 1; font-size: 1.2rem; border: none; background: transparent; color: inherit; outline: none; }
.editor { flex: 1; overflow-y: auto; padding: 2rem 3rem; line-height: 1.6; outline: none; }
.status-bar { display: flex; justify-content: space-between; padding: 0.3rem 1.5rem; font-size: 0.8rem; color: var(--text-muted); border-top: 1px solid var(--border-color); }
.modal { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.4); display: flex; align-items: center; justify-content: center; }
.modal-body { background: var(--bg-primary); padding: 1.5rem; border-radius: 8px; display: flex; flex-direction: column; gap: 0.5rem; min-width: 320px; }
.modal-actions { display: flex; gap: 0.5rem; justify-content: flex-end; }
.char-grid { display: grid; grid-template-columns: repeat(8, 2.5rem); gap: 0.25rem; }
.char-button { height: 2.5rem; font-size: 1.1rem; }
.status { position: fixed; bottom: 2.5rem; right: 1.5rem; padding: 0.5rem 1rem; border-radius: 6px; color: white; }
.status-info { background: #3b82f6; }
.status-success { background: #10b981; }
.status-error { background: #ef4444; }
"#;
