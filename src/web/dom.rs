use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, HtmlElement, Range, Selection};

use super::js_error;
use crate::surface::{Alignment, EditorSurface, InlineStyle};

/// A contenteditable element driven through `document.execCommand`.
pub struct DomSurface {
    element: HtmlElement,
}

impl DomSurface {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// Native `cut` or `copy` on the live selection.
    pub fn clipboard_command(&self, command: &str) {
        self.exec(command, "");
    }

    fn exec(&self, command: &str, value: &str) {
        let Some(document) = self
            .element
            .owner_document()
            .and_then(|doc| doc.dyn_into::<HtmlDocument>().ok())
        else {
            return;
        };
        if let Err(err) = document.exec_command_with_show_ui_and_value(command, false, value) {
            tracing::warn!(command, err = %js_error(&err), "execCommand failed");
        }
    }

    fn selection() -> Option<Selection> {
        web_sys::window()?.get_selection().ok().flatten()
    }
}

impl EditorSurface for DomSurface {
    type Range = Range;

    fn focus(&mut self) {
        let _ = self.element.focus();
    }

    fn live_range(&self) -> Option<Range> {
        let selection = Self::selection()?;
        if selection.range_count() == 0 {
            return None;
        }
        // The live range follows the caret; keep a detached copy.
        selection.get_range_at(0).ok().map(|range| range.clone_range())
    }

    fn contains_range(&self, range: &Range) -> bool {
        range
            .common_ancestor_container()
            .is_ok_and(|node| self.element.contains(Some(&node)))
    }

    fn set_live_range(&mut self, range: &Range) {
        let Some(selection) = Self::selection() else {
            return;
        };
        let _ = selection.remove_all_ranges();
        let _ = selection.add_range(range);
    }

    fn apply_inline_style(&mut self, style: &InlineStyle) {
        match style {
            InlineStyle::Bold | InlineStyle::Italic | InlineStyle::Underline => {
                self.exec(style.command_name(), "")
            }
            InlineStyle::FontSize(size) => {
                self.exec(style.command_name(), &size.step().to_string())
            }
            InlineStyle::Link(url) => self.exec(style.command_name(), url),
        }
    }

    fn apply_alignment(&mut self, alignment: Alignment) {
        self.exec(alignment.command_name(), "");
    }

    fn insert_text(&mut self, text: &str) {
        self.exec("insertText", text);
    }

    fn insert_fragment(&mut self, html: &str) {
        self.exec("insertHTML", html);
    }

    fn select_all(&mut self) {
        self.exec("selectAll", "");
    }

    fn content_html(&self) -> String {
        self.element.inner_html()
    }

    fn set_content_html(&mut self, html: &str) {
        self.element.set_inner_html(html);
    }

    fn plain_text(&self) -> String {
        self.element.inner_text()
    }
}
