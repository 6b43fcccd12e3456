//! The editing session: one explicit owner for everything the editor mutates.
//!
//! The host (browser shell or a test) forwards user events to the methods
//! here, then reads back what to render and which timers to arm through
//! [`NoteSession::take_scheduled_save`] and [`NoteSession::take_status_timer`].

use std::time::Duration;

use crate::autosave::{Debouncer, Ticket};
use crate::clock::Clock;
use crate::config::{Settings, Theme};
use crate::export::{ExportError, PdfJob};
use crate::history::HistoryStack;
use crate::html::TextStats;
use crate::import::{self, ImportError};
use crate::mutator::{EditCommand, Mutation, Mutator};
use crate::notes::{NoteId, NoteRepository, NoteSummary};
use crate::selection::SelectionTracker;
use crate::shortcuts::Shortcut;
use crate::status::{StatusKind, StatusLine, StatusMessage};
use crate::storage::{KeyValueStore, StorageError};
use crate::surface::EditorSurface;

/// Work a shortcut hands back to the host because it needs UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostAction {
    OpenFile,
    Print,
    OpenFind,
}

pub struct NoteSession<S: EditorSurface, K, C> {
    settings: Settings,
    repo: NoteRepository<K>,
    surface: S,
    selection: SelectionTracker<S::Range>,
    history: HistoryStack,
    autosave: Debouncer,
    scheduled_save: Option<Ticket>,
    status: StatusLine,
    status_timer: Option<u64>,
    clock: C,
    theme: Theme,
    current: Option<NoteId>,
    title: String,
    search: String,
    last_saved: Option<String>,
}

impl<S, K, C> NoteSession<S, K, C>
where
    S: EditorSurface,
    K: KeyValueStore,
    C: Clock,
{
    /// Loads settings, theme and notes, then opens the first note in list
    /// order, or a fresh one when there are none.
    pub fn start(store: K, surface: S, clock: C) -> Self {
        let settings = Settings::load(&store);
        let theme = Theme::load(&store);
        let repo = NoteRepository::open(store);
        let mut session = Self {
            history: HistoryStack::with_limit(settings.history_limit),
            autosave: Debouncer::new(settings.autosave_delay()),
            settings,
            repo,
            surface,
            selection: SelectionTracker::new(),
            scheduled_save: None,
            status: StatusLine::default(),
            status_timer: None,
            clock,
            theme,
            current: None,
            title: String::new(),
            search: String::new(),
            last_saved: None,
        };
        session.open_first_or_create();
        session
    }

    fn open_first_or_create(&mut self) {
        let first = self.repo.sorted().first().map(|note| note.id.clone());
        match first {
            Some(id) => {
                self.load_note(&id);
            }
            None => {
                self.create_note(None);
            }
        }
    }

    // Accessors

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// Typing not yet in the history counts as a step to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.has_unrecorded_typing()
    }

    /// Redo is lost once unrecorded typing is checkpointed.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo() && !self.has_unrecorded_typing()
    }

    fn has_unrecorded_typing(&self) -> bool {
        self.history
            .current()
            .is_some_and(|current| current != self.surface.content_html())
    }

    pub fn repository(&self) -> &NoteRepository<K> {
        &self.repo
    }

    pub fn current_id(&self) -> Option<&NoteId> {
        self.current.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.current()
    }

    pub fn last_saved(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    pub fn is_pinned(&self) -> bool {
        self.current
            .as_ref()
            .and_then(|id| self.repo.get(id))
            .is_some_and(|note| note.pinned)
    }

    pub fn stats(&self) -> TextStats {
        TextStats::of(&self.surface.plain_text())
    }

    pub fn note_count(&self) -> usize {
        self.repo.len()
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    /// Notes matching the current search, in display order.
    pub fn note_list(&self) -> Vec<NoteSummary> {
        self.repo
            .search(&self.search)
            .into_iter()
            .map(|note| note.summary(self.settings.preview_chars, &self.settings.untitled_title))
            .collect()
    }

    // Timers

    /// A save the host should run after `delay`, superseding earlier ones.
    pub fn take_scheduled_save(&mut self) -> Option<(Ticket, Duration)> {
        self.scheduled_save
            .take()
            .map(|ticket| (ticket, self.autosave.delay()))
    }

    pub fn take_status_timer(&mut self) -> Option<(u64, Duration)> {
        self.status_timer
            .take()
            .map(|generation| (generation, self.settings.status_duration()))
    }

    /// Runs the debounced save if `ticket` is still the latest one.
    pub fn autosave_elapsed(&mut self, ticket: Ticket) -> bool {
        if !self.autosave.fire(ticket) {
            return false;
        }
        tracing::debug!("autosave fired");
        self.save()
    }

    pub fn dismiss_status(&mut self, generation: u64) -> bool {
        self.status.dismiss(generation)
    }

    fn schedule_save(&mut self) {
        self.scheduled_save = Some(self.autosave.schedule());
    }

    fn notify(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status_timer = Some(self.status.show(text, kind));
    }

    fn report_storage_error(&mut self, err: &StorageError) {
        tracing::error!(%err, "storage write failed");
        self.notify(format!("Could not save: {err}"), StatusKind::Error);
    }

    /// Saves now if a debounced save is still waiting.
    fn flush_pending_save(&mut self) {
        if self.autosave.cancel() {
            self.save();
        }
    }

    fn replace_document(&mut self, html: &str) {
        self.surface.set_content_html(html);
        self.selection.invalidate();
    }

    // Note lifecycle

    pub fn create_note(&mut self, title: Option<&str>) -> NoteId {
        self.flush_pending_save();
        let title = title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(self.settings.new_note_title.as_str())
            .to_string();
        let (id, result) = self.repo.create(&title, self.clock.now());
        if let Err(err) = result {
            self.report_storage_error(&err);
        }
        self.current = Some(id.clone());
        self.title = title;
        self.replace_document("");
        self.history.reset(self.surface.content_html());
        id
    }

    /// Opens `id`. Re-opening the current note keeps the live document.
    pub fn load_note(&mut self, id: &NoteId) -> bool {
        if self.current.as_ref() == Some(id) {
            return true;
        }
        self.flush_pending_save();
        let Some(note) = self.repo.get(id) else {
            return false;
        };
        let title = note.title.clone();
        let content = note.content.clone();
        self.current = Some(id.clone());
        self.title = title;
        self.replace_document(&content);
        self.history.reset(self.surface.content_html());
        tracing::debug!(%id, "note loaded");
        true
    }

    /// Writes the title buffer and live document into the current note.
    pub fn save(&mut self) -> bool {
        let Some(id) = self.current.clone() else {
            return false;
        };
        self.autosave.cancel();
        self.scheduled_save = None;
        let title = match self.title.trim() {
            "" => self.settings.untitled_title.clone(),
            trimmed => trimmed.to_string(),
        };
        let content = self.surface.content_html();
        match self.repo.update(&id, &title, &content, self.clock.now()) {
            Ok(true) => {
                self.last_saved = Some(self.clock.local_time_string());
                true
            }
            Ok(false) => false,
            Err(err) => {
                self.report_storage_error(&err);
                false
            }
        }
    }

    pub fn save_now(&mut self) -> bool {
        let saved = self.save();
        if saved {
            self.notify("Saved!", StatusKind::Success);
        }
        saved
    }

    /// Deletes the current note once the user confirmed. The collection is
    /// never left empty.
    pub fn delete_current(&mut self, confirmed: bool) -> bool {
        let Some(id) = self.current.clone() else {
            return false;
        };
        if !confirmed {
            return false;
        }
        self.autosave.cancel();
        self.scheduled_save = None;
        if let Err(err) = self.repo.delete(&id) {
            self.report_storage_error(&err);
        }
        self.current = None;
        self.open_first_or_create();
        true
    }

    pub fn toggle_pin(&mut self) -> Option<bool> {
        let id = self.current.clone()?;
        match self.repo.toggle_pin(&id) {
            Ok(pinned) => pinned,
            Err(err) => {
                self.report_storage_error(&err);
                self.repo.get(&id).map(|note| note.pinned)
            }
        }
    }

    /// Creates a note from an imported file and saves it straight away.
    pub fn import_file(&mut self, file_name: &str, raw: &str) -> NoteId {
        let imported = import::import_file(file_name, raw);
        let id = self.create_note(Some(&imported.title));
        self.replace_document(&imported.content);
        self.history.reset(self.surface.content_html());
        self.save();
        tracing::info!(%id, file_name, "file imported");
        id
    }

    pub fn import_failed(&mut self, err: &ImportError) {
        tracing::warn!(%err, "import failed");
        self.notify(err.to_string(), StatusKind::Error);
    }

    // Editing events

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.schedule_save();
    }

    /// The user typed into the surface.
    pub fn content_changed(&mut self) {
        self.selection.capture(&self.surface);
        self.schedule_save();
    }

    /// Space or Enter released: record the typing so far as an undo step.
    pub fn typing_boundary(&mut self) -> bool {
        let live = self.surface.content_html();
        self.history.record(&live)
    }

    pub fn capture_selection(&mut self) -> bool {
        self.selection.capture(&self.surface)
    }

    /// Puts the stored selection back, for host commands that act on it
    /// directly such as native cut and copy.
    pub fn restore_selection(&mut self) {
        self.selection.restore(&mut self.surface);
    }

    pub fn apply(&mut self, command: EditCommand) -> Mutation {
        if self.current.is_none() {
            return Mutation::Abandoned;
        }
        let outcome =
            Mutator::new(&mut self.surface, &mut self.selection, &mut self.history).apply(command);
        if outcome == Mutation::Applied {
            self.schedule_save();
        }
        outcome
    }

    pub fn insert_date(&mut self) -> Mutation {
        let stamp = self.clock.local_date_string();
        self.apply(EditCommand::InsertText(stamp))
    }

    /// Inserts clipboard text, or explains the fallback when the clipboard
    /// could not be read.
    pub fn paste(&mut self, clipboard: Result<String, String>) -> Mutation {
        match clipboard {
            Ok(text) => self.apply(EditCommand::InsertText(text)),
            Err(reason) => {
                tracing::debug!(%reason, "clipboard read refused");
                self.surface.focus();
                self.notify("Use Ctrl+V to paste", StatusKind::Info);
                Mutation::Abandoned
            }
        }
    }

    pub fn select_all(&mut self) {
        self.surface.focus();
        self.surface.select_all();
        self.selection.capture(&self.surface);
    }

    pub fn replace_first(&mut self, find: &str, replacement: &str) -> usize {
        if self.current.is_none() {
            return 0;
        }
        let count = Mutator::new(&mut self.surface, &mut self.selection, &mut self.history)
            .replace_first(find, replacement);
        if count > 0 {
            self.schedule_save();
        }
        count
    }

    pub fn replace_all(&mut self, find: &str, replacement: &str) -> usize {
        if self.current.is_none() {
            return 0;
        }
        let count = Mutator::new(&mut self.surface, &mut self.selection, &mut self.history)
            .replace_all(find, replacement);
        if count > 0 {
            self.schedule_save();
            self.notify("Replaced All", StatusKind::Success);
        }
        count
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(HistoryStack::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(HistoryStack::redo)
    }

    fn step_history(&mut self, step: fn(&mut HistoryStack) -> Option<&str>) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.typing_boundary();
        let Some(snapshot) = step(&mut self.history).map(str::to_owned) else {
            return false;
        };
        self.replace_document(&snapshot);
        self.schedule_save();
        true
    }

    pub fn run_shortcut(&mut self, shortcut: Shortcut) -> Option<HostAction> {
        match shortcut {
            Shortcut::Save => {
                self.save_now();
                None
            }
            Shortcut::New => {
                self.create_note(None);
                None
            }
            Shortcut::Open => Some(HostAction::OpenFile),
            Shortcut::Print => Some(HostAction::Print),
            Shortcut::Find => {
                self.capture_selection();
                Some(HostAction::OpenFind)
            }
            Shortcut::Bold => {
                self.apply(EditCommand::Bold);
                None
            }
            Shortcut::Italic => {
                self.apply(EditCommand::Italic);
                None
            }
            Shortcut::Underline => {
                self.apply(EditCommand::Underline);
                None
            }
        }
    }

    // Export and appearance

    pub fn begin_pdf_export(&mut self) -> Option<PdfJob> {
        self.current.as_ref()?;
        self.notify("Generating PDF...", StatusKind::Info);
        Some(PdfJob::new(
            &self.title,
            &self.surface.content_html(),
            &self.settings.untitled_title,
        ))
    }

    pub fn finish_pdf_export(&mut self, result: Result<(), ExportError>) {
        match result {
            Ok(()) => self.notify("Downloaded!", StatusKind::Success),
            Err(err) => {
                tracing::warn!(%err, "pdf export failed");
                self.notify(err.to_string(), StatusKind::Error);
            }
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(err) = self.theme.save(self.repo.store_mut()) {
            tracing::warn!(%err, "theme not persisted");
        }
        self.theme
    }
}
