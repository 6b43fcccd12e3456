use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::time::Duration;

use inkpad::clock::ManualClock;
use inkpad::config::Theme;
use inkpad::export::{ExportError, PdfJob, PdfRenderer};
use inkpad::shortcuts::Shortcut;
use inkpad::status::StatusKind;
use inkpad::storage::{CORRUPT_NOTES_KEY, NOTES_KEY, THEME_KEY};
use inkpad::{EditCommand, EditorSurface, HostAction, MemoryStore, Mutation, NoteSession, RichDocument};

const T0: i64 = 1_700_000_000_000;

type Session<'c> = NoteSession<RichDocument, MemoryStore, &'c ManualClock>;

fn start(store: MemoryStore, clock: &ManualClock) -> Session<'_> {
    NoteSession::start(store, RichDocument::new(), clock)
}

fn html(session: &Session<'_>) -> String {
    session.surface().content_html()
}

fn type_text(session: &mut Session<'_>, text: &str) {
    let doc = session.surface_mut();
    doc.focus();
    doc.insert_text(text);
    session.content_changed();
}

#[test]
fn empty_store_opens_one_blank_note() {
    let clock = ManualClock::from_millis(T0);
    let session = start(MemoryStore::new(), &clock);

    assert_eq!(session.note_count(), 1);
    assert_eq!(session.title(), "Untitled Note");
    assert_eq!(html(&session), "");
    assert_eq!(session.current_id().map(|id| id.as_str()), Some("1700000000000"));
    assert!(session.repository().store().get(NOTES_KEY).is_some());
    assert!(!session.history().can_undo());
}

#[test]
fn corrupt_notes_are_kept_aside_on_start() {
    let clock = ManualClock::from_millis(T0);
    let store = MemoryStore::new().with_entry(NOTES_KEY, "{not json");
    let session = start(store, &clock);

    assert_eq!(session.note_count(), 1);
    assert_eq!(
        session.repository().store().get(CORRUPT_NOTES_KEY),
        Some("{not json")
    );
}

#[test]
fn bold_then_typing_undoes_step_by_step() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);

    type_text(&mut session, "Hello");
    session.surface_mut().select(0, 5);
    session.capture_selection();
    session.surface_mut().blur();
    assert_eq!(session.apply(EditCommand::Bold), Mutation::Applied);
    assert_eq!(html(&session), "<b>Hello</b>");

    session.surface_mut().move_to_end();
    type_text(&mut session, " World");
    assert!(html(&session).ends_with(" World"));

    assert!(session.undo());
    assert_eq!(html(&session), "<b>Hello</b>");
    assert!(session.undo());
    assert_eq!(html(&session), "Hello");
    assert!(session.redo());
    assert_eq!(html(&session), "<b>Hello</b>");
}

#[test]
fn typing_boundaries_become_undo_steps() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);

    type_text(&mut session, "one ");
    assert!(session.typing_boundary());
    assert!(!session.typing_boundary());
    type_text(&mut session, "two");

    assert!(session.undo());
    assert_eq!(html(&session), "one ");
    assert!(session.undo());
    assert_eq!(html(&session), "");
    assert!(!session.undo());
}

#[test]
fn switching_notes_resets_history_and_flushes_the_draft() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let first = session.current_id().cloned().unwrap();

    type_text(&mut session, "draft");
    clock.advance_millis(10);
    session.create_note(Some("Next"));

    assert_eq!(html(&session), "");
    assert!(!session.history().can_undo());
    assert_eq!(session.repository().get(&first).unwrap().content, "draft");
    assert!(session.take_scheduled_save().is_none());

    assert!(session.load_note(&first));
    assert_eq!(html(&session), "draft");
    assert_eq!(session.title(), "Untitled Note");
}

#[test]
fn reopening_the_current_note_keeps_unsaved_typing() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let id = session.current_id().cloned().unwrap();

    type_text(&mut session, "draft");
    let (ticket, _) = session.take_scheduled_save().unwrap();
    assert!(session.load_note(&id));
    assert_eq!(html(&session), "draft");

    assert!(session.autosave_elapsed(ticket));
    assert_eq!(session.repository().get(&id).unwrap().content, "draft");
    assert!(session.can_undo());
}

#[test]
fn unrecorded_typing_enables_undo_and_disables_redo() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    assert!(!session.can_undo());

    type_text(&mut session, "Hello");
    assert!(!session.history().can_undo());
    assert!(session.can_undo());
    assert!(!session.can_redo());

    assert!(session.undo());
    assert_eq!(html(&session), "");
    assert!(session.can_redo());
    assert!(!session.can_undo());

    type_text(&mut session, "x");
    assert!(!session.can_redo());
    assert!(session.can_undo());
}

#[test]
fn autosave_runs_only_the_latest_ticket() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let id = session.current_id().cloned().unwrap();

    session.set_title("A");
    let (stale, delay) = session.take_scheduled_save().unwrap();
    assert_eq!(delay, Duration::from_secs(1));
    session.set_title("AB");
    let (latest, _) = session.take_scheduled_save().unwrap();

    assert!(!session.autosave_elapsed(stale));
    assert_eq!(session.repository().get(&id).unwrap().title, "Untitled Note");

    clock.advance_millis(1000);
    assert!(session.autosave_elapsed(latest));
    let note = session.repository().get(&id).unwrap();
    assert_eq!(note.title, "AB");
    assert_eq!(note.updated_at.timestamp_millis(), T0 + 1000);
    assert!(session.last_saved().is_some());
    assert!(!session.autosave_elapsed(latest));
}

#[test]
fn blank_title_is_saved_as_untitled() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let id = session.current_id().cloned().unwrap();

    session.set_title("   ");
    assert!(session.save_now());
    assert_eq!(session.repository().get(&id).unwrap().title, "Untitled");
    assert_eq!(session.status().map(|s| s.text.as_str()), Some("Saved!"));

    session.set_title("  Plans  ");
    session.save();
    assert_eq!(session.repository().get(&id).unwrap().title, "Plans");
}

#[test]
fn import_escapes_markup_and_saves() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);

    clock.advance_millis(5);
    let id = session.import_file("evil.txt", "<script>alert(1)</script>\nbye");

    assert_eq!(session.title(), "evil");
    assert_eq!(
        html(&session),
        "&lt;script&gt;alert(1)&lt;/script&gt;<br>bye"
    );
    assert_eq!(session.repository().get(&id).unwrap().content, html(&session));
    assert_eq!(session.note_count(), 2);
    assert!(!session.history().can_undo());
}

#[test]
fn pinned_notes_lead_the_list() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let first = session.current_id().cloned().unwrap();
    clock.advance_millis(10);
    let second = session.create_note(Some("Second"));

    let order: Vec<_> = session.note_list().into_iter().map(|n| n.id).collect();
    assert_eq!(order, [second.clone(), first.clone()]);

    session.load_note(&first);
    assert_eq!(session.toggle_pin(), Some(true));
    assert!(session.is_pinned());
    let list = session.note_list();
    assert_eq!(list[0].id, first);
    assert!(list[0].pinned);
}

#[test]
fn search_filters_the_list() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    session.set_title("Groceries");
    session.save();
    clock.advance_millis(1);
    session.create_note(Some("Work"));
    type_text(&mut session, "deadline friday");
    session.save();

    session.set_search("groc");
    let titles: Vec<_> = session.note_list().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, ["Groceries"]);
    session.set_search("FRIDAY");
    let titles: Vec<_> = session.note_list().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, ["Work"]);
}

#[test]
fn deleting_needs_confirmation_and_never_empties_the_collection() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let original = session.current_id().cloned().unwrap();
    type_text(&mut session, "keep?");

    assert!(!session.delete_current(false));
    assert_eq!(session.current_id(), Some(&original));

    clock.advance_millis(50);
    assert!(session.delete_current(true));
    assert_eq!(session.note_count(), 1);
    assert_ne!(session.current_id(), Some(&original));
    assert_eq!(session.title(), "Untitled Note");
    assert_eq!(html(&session), "");
    assert!(session.take_scheduled_save().is_none());
}

#[test]
fn ids_stay_unique_when_created_together() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    let a = session.create_note(None);
    let b = session.create_note(None);
    let c = session.current_id().cloned().unwrap();

    assert_ne!(a, b);
    assert_eq!(b, c);
    assert_eq!(session.note_count(), 3);
}

#[test]
fn replace_all_is_one_undo_step() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    type_text(&mut session, "cat (cat) cat");

    assert_eq!(session.replace_all("(cat)", "dog"), 1);
    assert_eq!(html(&session), "cat dog cat");
    assert_eq!(session.replace_all("cat", "$1"), 2);
    assert_eq!(html(&session), "$1 dog $1");
    assert_eq!(session.status().map(|s| s.text.as_str()), Some("Replaced All"));
    assert_eq!(session.replace_first("", "x"), 0);

    assert!(session.undo());
    assert_eq!(html(&session), "cat dog cat");
    assert!(session.undo());
    assert_eq!(html(&session), "cat (cat) cat");
}

#[test]
fn paste_falls_back_to_a_hint() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);

    assert_eq!(session.paste(Err("denied".into())), Mutation::Abandoned);
    let status = session.status().cloned().unwrap();
    assert_eq!(status.text, "Use Ctrl+V to paste");
    assert_eq!(status.kind, StatusKind::Info);
    let (generation, delay) = session.take_status_timer().unwrap();
    assert_eq!(delay, Duration::from_secs(2));
    assert!(session.dismiss_status(generation));
    assert!(session.status().is_none());

    session.surface_mut().move_to_end();
    session.capture_selection();
    assert_eq!(session.paste(Ok("pasted".into())), Mutation::Applied);
    assert_eq!(html(&session), "pasted");
}

#[test]
fn insert_date_uses_the_clock() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    session.surface_mut().focus();
    session.capture_selection();

    session.insert_date();
    assert_eq!(html(&session), "11/14/2023, 10:13:20 PM");
}

#[test]
fn shortcuts_run_or_defer_to_the_host() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);

    assert_eq!(session.run_shortcut(Shortcut::Find), Some(HostAction::OpenFind));
    assert_eq!(session.run_shortcut(Shortcut::Print), Some(HostAction::Print));
    assert_eq!(session.run_shortcut(Shortcut::Open), Some(HostAction::OpenFile));
    assert_eq!(session.run_shortcut(Shortcut::Save), None);
    assert_eq!(session.status().map(|s| s.text.as_str()), Some("Saved!"));

    clock.advance_millis(1);
    assert_eq!(session.run_shortcut(Shortcut::New), None);
    assert_eq!(session.note_count(), 2);
}

#[test]
fn theme_toggle_is_persisted() {
    let clock = ManualClock::from_millis(T0);
    let store = MemoryStore::new().with_entry(THEME_KEY, "dark");
    let mut session = start(store, &clock);

    assert_eq!(session.theme(), Theme::Dark);
    assert_eq!(session.toggle_theme(), Theme::Light);
    assert_eq!(session.repository().store().get(THEME_KEY), Some("light"));
}

#[derive(Default)]
struct RecordingRenderer {
    jobs: RefCell<Vec<PdfJob>>,
    fail: bool,
}

impl PdfRenderer for RecordingRenderer {
    async fn render(&self, job: PdfJob) -> Result<(), ExportError> {
        self.jobs.borrow_mut().push(job);
        if self.fail {
            Err(ExportError::Render("boom".into()))
        } else {
            Ok(())
        }
    }
}

#[test]
fn pdf_export_reports_progress() {
    let clock = ManualClock::from_millis(T0);
    let mut session = start(MemoryStore::new(), &clock);
    session.set_title("Q3 <Plan>");
    type_text(&mut session, "numbers");

    let job = session.begin_pdf_export().unwrap();
    assert_eq!(
        session.status().map(|s| s.text.as_str()),
        Some("Generating PDF...")
    );
    assert_eq!(job.filename, "Q3 _Plan_.pdf");
    assert!(job.fragment.contains("Q3 &lt;Plan&gt;"));
    assert!(job.fragment.contains("numbers"));

    let renderer = RecordingRenderer::default();
    let result = pollster::block_on(renderer.render(job));
    session.finish_pdf_export(result);
    assert_eq!(session.status().map(|s| s.text.as_str()), Some("Downloaded!"));
    assert_eq!(renderer.jobs.borrow().len(), 1);

    let failing = RecordingRenderer {
        fail: true,
        ..Default::default()
    };
    let job = session.begin_pdf_export().unwrap();
    session.finish_pdf_export(pollster::block_on(failing.render(job)));
    let status = session.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "PDF rendering failed: boom");
}
