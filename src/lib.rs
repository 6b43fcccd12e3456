//! Inkpad: a rich-text note pad that keeps its notes in browser storage.
//!
//! Everything except [`app`] and [`web`] is plain Rust and runs natively,
//! which is how the editing rules are tested.

pub mod app;
pub mod autosave;
pub mod clock;
pub mod config;
pub mod document;
pub mod export;
pub mod history;
pub mod html;
pub mod import;
pub mod mutator;
pub mod notes;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod status;
pub mod storage;
pub mod surface;
pub mod web;

pub use document::RichDocument;
pub use history::HistoryStack;
pub use mutator::{EditCommand, Mutation};
pub use notes::{Note, NoteId, NoteRepository};
pub use session::{HostAction, NoteSession};
pub use storage::{KeyValueStore, MemoryStore};
pub use surface::EditorSurface;

/// Installs logging and mounts the app on `<body>`.
pub fn run() {
    web::logging::init();
    leptos::mount::mount_to_body(app::App);
}
