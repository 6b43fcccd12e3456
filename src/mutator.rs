use regex::{NoExpand, Regex};

use crate::history::HistoryStack;
use crate::selection::SelectionTracker;
use crate::surface::{Alignment, EditorSurface, FontSize, InlineStyle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditCommand {
    Bold,
    Italic,
    Underline,
    /// Link the selection to a URL supplied by the user; `None` means the
    /// prompt was dismissed.
    Link(Option<String>),
    Align(Alignment),
    FontSize(FontSize),
    InsertText(String),
    InsertHtml(String),
}

impl EditCommand {
    pub fn non_breaking_space() -> Self {
        Self::InsertHtml("&nbsp;".to_string())
    }

    /// Maps a toolbar `data-format` value onto a command. Links need a URL
    /// and are built separately.
    pub fn from_format(format: &str) -> Option<Self> {
        match format {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "underline" => Some(Self::Underline),
            other => Alignment::from_command(other).map(Self::Align),
        }
    }

    /// Maps a toolbar select value onto a command. The blank placeholder
    /// option maps to nothing.
    pub fn from_select_value(value: &str) -> Option<Self> {
        Self::from_format(value).or_else(|| FontSize::parse(value).map(Self::FontSize))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    Abandoned,
}

/// Applies commands to the tracked selection and records the result.
pub struct Mutator<'a, S: EditorSurface> {
    surface: &'a mut S,
    selection: &'a mut SelectionTracker<S::Range>,
    history: &'a mut HistoryStack,
}

impl<'a, S: EditorSurface> Mutator<'a, S> {
    pub fn new(
        surface: &'a mut S,
        selection: &'a mut SelectionTracker<S::Range>,
        history: &'a mut HistoryStack,
    ) -> Self {
        Self {
            surface,
            selection,
            history,
        }
    }

    /// Records typing that has not reached the history yet.
    pub fn checkpoint(&mut self) -> bool {
        let live = self.surface.content_html();
        self.history.record(&live)
    }

    pub fn apply(&mut self, command: EditCommand) -> Mutation {
        let link = match &command {
            EditCommand::Link(url) => match url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => Some(url.to_string()),
                _ => return Mutation::Abandoned,
            },
            _ => None,
        };

        self.selection.restore(&mut *self.surface);
        self.checkpoint();

        match command {
            EditCommand::Bold => self.surface.apply_inline_style(&InlineStyle::Bold),
            EditCommand::Italic => self.surface.apply_inline_style(&InlineStyle::Italic),
            EditCommand::Underline => self.surface.apply_inline_style(&InlineStyle::Underline),
            EditCommand::Link(_) => {
                if let Some(url) = link {
                    self.surface.apply_inline_style(&InlineStyle::Link(url));
                }
            }
            EditCommand::Align(alignment) => self.surface.apply_alignment(alignment),
            EditCommand::FontSize(size) => {
                self.surface.apply_inline_style(&InlineStyle::FontSize(size))
            }
            EditCommand::InsertText(text) => self.surface.insert_text(&text),
            EditCommand::InsertHtml(fragment) => self.surface.insert_fragment(&fragment),
        }

        self.surface.focus();
        self.selection.capture(&*self.surface);
        self.checkpoint();
        Mutation::Applied
    }

    /// Replaces the first literal occurrence of `find` in the serialized
    /// document. Returns the number of replacements.
    pub fn replace_first(&mut self, find: &str, replacement: &str) -> usize {
        if find.is_empty() {
            return 0;
        }
        let html = self.surface.content_html();
        if !html.contains(find) {
            return 0;
        }
        let replaced = html.replacen(find, replacement, 1);
        self.commit_replacement(&html, &replaced);
        1
    }

    /// Replaces every literal occurrence of `find`; the search text never acts
    /// as a pattern.
    pub fn replace_all(&mut self, find: &str, replacement: &str) -> usize {
        if find.is_empty() {
            return 0;
        }
        let re = match Regex::new(&regex::escape(find)) {
            Ok(re) => re,
            Err(err) => {
                tracing::warn!(%err, "find pattern rejected");
                return 0;
            }
        };
        let html = self.surface.content_html();
        let count = re.find_iter(&html).count();
        if count == 0 {
            return 0;
        }
        let replaced = re.replace_all(&html, NoExpand(replacement)).into_owned();
        self.commit_replacement(&html, &replaced);
        count
    }

    fn commit_replacement(&mut self, before: &str, after: &str) {
        if before == after {
            return;
        }
        self.history.record(before);
        self.surface.set_content_html(after);
        self.selection.invalidate();
        let live = self.surface.content_html();
        self.history.add(live);
    }
}
