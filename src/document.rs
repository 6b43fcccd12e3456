//! In-memory rich-text document implementing [`EditorSurface`].
//!
//! Content is a flat sequence of styled characters. Paragraph boundaries are
//! stored as `BLOCK_SEP` cells with one alignment per paragraph; soft line
//! breaks are `'\n'` cells. Offsets are character offsets into the rendered
//! text, where a paragraph boundary counts as one character.

use crate::html::{self, Token};
use crate::surface::{Alignment, EditorSurface, FontSize, InlineStyle};

const BLOCK_SEP: char = '\u{2029}';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DocRange {
    pub start: usize,
    pub end: usize,
}

impl DocRange {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_collapsed(self) -> bool {
        self.start == self.end
    }

    fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct Marks {
    bold: bool,
    italic: bool,
    underline: bool,
    size: Option<FontSize>,
    link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Cell {
    ch: char,
    marks: Marks,
}

impl Cell {
    fn is_text(&self) -> bool {
        self.ch != BLOCK_SEP
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichDocument {
    cells: Vec<Cell>,
    aligns: Vec<Alignment>,
    selection: DocRange,
    focused: bool,
    pending: Option<Marks>,
}

impl Default for RichDocument {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            aligns: vec![Alignment::Left],
            selection: DocRange::default(),
            focused: false,
            pending: None,
        }
    }
}

impl RichDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_html(html: &str) -> Self {
        let (cells, aligns) = parse(html);
        Self {
            cells,
            aligns,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn selection(&self) -> DocRange {
        self.selection
    }

    /// Focuses the document and selects `start..end`.
    pub fn select(&mut self, start: usize, end: usize) {
        self.focused = true;
        self.selection = DocRange::new(start, end).clamp(self.len());
        self.pending = None;
    }

    pub fn move_to_end(&mut self) {
        let len = self.len();
        self.select(len, len);
    }

    /// Moves focus elsewhere, e.g. onto a toolbar button.
    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn alignment_at(&self, pos: usize) -> Alignment {
        self.aligns
            .get(self.block_of(pos))
            .copied()
            .unwrap_or_default()
    }

    fn block_of(&self, pos: usize) -> usize {
        self.cells[..pos.min(self.len())]
            .iter()
            .filter(|cell| cell.ch == BLOCK_SEP)
            .count()
    }

    fn marks_at_cursor(&self, pos: usize) -> Marks {
        let left = pos
            .checked_sub(1)
            .and_then(|i| self.cells.get(i))
            .filter(|cell| cell.is_text() && cell.ch != '\n');
        let right = self
            .cells
            .get(pos)
            .filter(|cell| cell.is_text() && cell.ch != '\n');
        match (left, right) {
            (Some(l), Some(r)) if l.marks == r.marks => l.marks.clone(),
            _ => Marks::default(),
        }
    }

    fn delete_range(&mut self, range: DocRange) {
        let range = range.clamp(self.len());
        if range.is_collapsed() {
            return;
        }
        let first_block = self.block_of(range.start);
        let merged = self.cells[range.start..range.end]
            .iter()
            .filter(|cell| cell.ch == BLOCK_SEP)
            .count();
        self.cells.drain(range.start..range.end);
        if merged > 0 {
            self.aligns.drain(first_block + 1..first_block + 1 + merged);
        }
        self.selection = DocRange::cursor(range.start);
    }

    fn insert_cells(&mut self, cells: Vec<Cell>, extra_aligns: Vec<Alignment>) {
        let selection = self.selection.clamp(self.len());
        self.delete_range(selection);
        let at = selection.start;
        let block = self.block_of(at);
        let inserted = cells.len();
        self.cells.splice(at..at, cells);
        let insert_at = (block + 1).min(self.aligns.len());
        self.aligns.splice(insert_at..insert_at, extra_aligns);
        self.selection = DocRange::cursor(at + inserted);
        self.pending = None;
    }

    fn toggle_flag(&mut self, range: DocRange, get: fn(&Marks) -> bool, set: fn(&mut Marks, bool)) {
        let all_set = self.cells[range.start..range.end]
            .iter()
            .filter(|cell| cell.is_text())
            .all(|cell| get(&cell.marks));
        for cell in &mut self.cells[range.start..range.end] {
            if cell.is_text() {
                set(&mut cell.marks, !all_set);
            }
        }
    }
}

fn toggle_pending(marks: &mut Marks, style: &InlineStyle) {
    match style {
        InlineStyle::Bold => marks.bold = !marks.bold,
        InlineStyle::Italic => marks.italic = !marks.italic,
        InlineStyle::Underline => marks.underline = !marks.underline,
        InlineStyle::FontSize(size) => marks.size = Some(*size),
        InlineStyle::Link(url) => marks.link = Some(url.clone()),
    }
}

impl EditorSurface for RichDocument {
    type Range = DocRange;

    fn focus(&mut self) {
        self.focused = true;
    }

    fn live_range(&self) -> Option<DocRange> {
        self.focused.then_some(self.selection)
    }

    fn contains_range(&self, range: &DocRange) -> bool {
        range.end <= self.len()
    }

    fn set_live_range(&mut self, range: &DocRange) {
        self.selection = range.clamp(self.len());
        self.pending = None;
    }

    fn apply_inline_style(&mut self, style: &InlineStyle) {
        let range = self.selection.clamp(self.len());
        if range.is_collapsed() {
            if let InlineStyle::Link(url) = style {
                let marks = Marks {
                    link: Some(url.clone()),
                    ..self.marks_at_cursor(range.start)
                };
                let cells = url.chars().map(|ch| Cell { ch, marks: marks.clone() }).collect();
                self.insert_cells(cells, Vec::new());
                return;
            }
            let mut marks = self
                .pending
                .take()
                .unwrap_or_else(|| self.marks_at_cursor(range.start));
            toggle_pending(&mut marks, style);
            self.pending = Some(marks);
            return;
        }

        match style {
            InlineStyle::Bold => self.toggle_flag(range, |m| m.bold, |m, on| m.bold = on),
            InlineStyle::Italic => self.toggle_flag(range, |m| m.italic, |m, on| m.italic = on),
            InlineStyle::Underline => {
                self.toggle_flag(range, |m| m.underline, |m, on| m.underline = on)
            }
            InlineStyle::FontSize(size) => {
                for cell in self.cells[range.start..range.end].iter_mut().filter(|c| c.is_text()) {
                    cell.marks.size = Some(*size);
                }
            }
            InlineStyle::Link(url) => {
                for cell in self.cells[range.start..range.end].iter_mut().filter(|c| c.is_text()) {
                    cell.marks.link = Some(url.clone());
                }
            }
        }
    }

    fn apply_alignment(&mut self, alignment: Alignment) {
        let range = self.selection.clamp(self.len());
        let first = self.block_of(range.start);
        let last = self.block_of(range.end);
        for align in &mut self.aligns[first..=last] {
            *align = alignment;
        }
    }

    fn insert_text(&mut self, text: &str) {
        let selection = self.selection.clamp(self.len());
        self.delete_range(selection);
        let marks = self
            .pending
            .take()
            .unwrap_or_else(|| self.marks_at_cursor(selection.start));
        let cells = text
            .chars()
            .filter(|ch| *ch != '\r')
            .map(|ch| Cell {
                ch: if ch == BLOCK_SEP { '\n' } else { ch },
                marks: marks.clone(),
            })
            .collect();
        self.insert_cells(cells, Vec::new());
    }

    fn insert_fragment(&mut self, html: &str) {
        let (cells, aligns) = parse(html);
        let extra = aligns.into_iter().skip(1).collect();
        self.insert_cells(cells, extra);
    }

    fn select_all(&mut self) {
        let len = self.len();
        self.select(0, len);
    }

    fn content_html(&self) -> String {
        serialize(&self.cells, &self.aligns)
    }

    fn set_content_html(&mut self, html: &str) {
        let (cells, aligns) = parse(html);
        self.cells = cells;
        self.aligns = aligns;
        self.selection = DocRange::cursor(self.len());
        self.pending = None;
    }

    fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|cell| if cell.ch == BLOCK_SEP { '\n' } else { cell.ch })
            .collect()
    }
}

fn open_tags(out: &mut String, marks: &Marks) {
    if let Some(link) = &marks.link {
        out.push_str(&format!("<a href=\"{}\">", html::escape_attr(link)));
    }
    if let Some(size) = marks.size {
        out.push_str(&format!("<font size=\"{}\">", size.step()));
    }
    if marks.bold {
        out.push_str("<b>");
    }
    if marks.italic {
        out.push_str("<i>");
    }
    if marks.underline {
        out.push_str("<u>");
    }
}

fn close_tags(out: &mut String, marks: &Marks) {
    if marks.underline {
        out.push_str("</u>");
    }
    if marks.italic {
        out.push_str("</i>");
    }
    if marks.bold {
        out.push_str("</b>");
    }
    if marks.size.is_some() {
        out.push_str("</font>");
    }
    if marks.link.is_some() {
        out.push_str("</a>");
    }
}

fn serialize_block(out: &mut String, cells: &[Cell]) {
    let mut start = 0usize;
    while start < cells.len() {
        let marks = &cells[start].marks;
        let end = cells[start..]
            .iter()
            .position(|cell| &cell.marks != marks)
            .map(|offset| start + offset)
            .unwrap_or(cells.len());
        let text: String = cells[start..end].iter().map(|cell| cell.ch).collect();
        open_tags(out, marks);
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                out.push_str("<br>");
            }
            out.push_str(&html::escape_text(line));
        }
        close_tags(out, marks);
        start = end;
    }
}

fn serialize(cells: &[Cell], aligns: &[Alignment]) -> String {
    let blocks: Vec<&[Cell]> = cells.split(|cell| cell.ch == BLOCK_SEP).collect();
    let mut out = String::new();
    if blocks.len() == 1 && aligns.first().copied().unwrap_or_default() == Alignment::Left {
        serialize_block(&mut out, blocks[0]);
        return out;
    }
    for (idx, block) in blocks.iter().enumerate() {
        match aligns.get(idx).copied().unwrap_or_default() {
            Alignment::Left => out.push_str("<div>"),
            align => out.push_str(&format!("<div style=\"text-align: {};\">", align.css_value())),
        }
        if block.is_empty() {
            out.push_str("<br>");
        } else {
            serialize_block(&mut out, block);
        }
        out.push_str("</div>");
    }
    out
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "div" | "p" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre"
    )
}

fn block_alignment(attrs: &str) -> Alignment {
    html::style_property(attrs, "text-align")
        .or_else(|| html::attr(attrs, "align"))
        .and_then(|value| Alignment::from_css(&value))
        .unwrap_or_default()
}

fn marks_for_tag(name: &str, attrs: &str, marks: &mut Marks) {
    match name {
        "b" | "strong" => marks.bold = true,
        "i" | "em" => marks.italic = true,
        "u" | "ins" => marks.underline = true,
        "font" => {
            if let Some(size) = html::attr(attrs, "size").and_then(|raw| FontSize::parse(&raw)) {
                marks.size = Some(size);
            }
        }
        "a" => {
            if let Some(href) = html::attr(attrs, "href") {
                marks.link = Some(href);
            }
        }
        "span" => {
            let weight = html::style_property(attrs, "font-weight").unwrap_or_default();
            if weight == "bold" || weight == "700" {
                marks.bold = true;
            }
            if html::style_property(attrs, "font-style").as_deref() == Some("italic") {
                marks.italic = true;
            }
            if html::style_property(attrs, "text-decoration")
                .is_some_and(|value| value.contains("underline"))
            {
                marks.underline = true;
            }
        }
        _ => {}
    }
}

struct Parser {
    cells: Vec<Cell>,
    aligns: Vec<Alignment>,
    block_start: usize,
    need_block: bool,
}

impl Parser {
    fn start_block(&mut self, align: Alignment) {
        self.finish_block();
        self.cells.push(Cell {
            ch: BLOCK_SEP,
            marks: Marks::default(),
        });
        self.aligns.push(align);
        self.block_start = self.cells.len();
    }

    /// A paragraph holding only its placeholder `<br>` is empty.
    fn finish_block(&mut self) {
        let block = &self.cells[self.block_start..];
        if block.len() == 1 && block[0].ch == '\n' {
            self.cells.truncate(self.block_start);
        }
    }

    fn ensure_block(&mut self) {
        if self.need_block {
            self.need_block = false;
            self.start_block(Alignment::Left);
        }
    }
}

fn is_source_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\t')
}

/// Whitespace runs holding a line break or tab come from source formatting
/// and render as one space. Plain space runs are kept as typed.
fn collapse_source_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            run.push(ch);
            continue;
        }
        flush_whitespace(&mut out, &mut run);
        out.push(ch);
    }
    flush_whitespace(&mut out, &mut run);
    out
}

fn flush_whitespace(out: &mut String, run: &mut String) {
    if run.contains(is_source_break) {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}

fn parse(input: &str) -> (Vec<Cell>, Vec<Alignment>) {
    let mut parser = Parser {
        cells: Vec::new(),
        aligns: vec![Alignment::Left],
        block_start: 0,
        need_block: false,
    };
    let mut current = Marks::default();
    let mut stack: Vec<(String, Marks)> = Vec::new();
    let mut touched = false;

    for token in html::tokenize(input) {
        match token {
            Token::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                let formatting_only = text.chars().all(|ch| ch.is_ascii_whitespace())
                    && (parser.need_block || (!touched && text.contains(is_source_break)));
                if formatting_only {
                    continue;
                }
                parser.ensure_block();
                touched = true;
                parser.cells.extend(
                    collapse_source_whitespace(&text)
                        .chars()
                        .filter(|&ch| ch != BLOCK_SEP)
                        .map(|ch| Cell {
                            ch,
                            marks: current.clone(),
                        }),
                );
            }
            Token::Open { name, .. } if name == "br" => {
                parser.ensure_block();
                touched = true;
                parser.cells.push(Cell {
                    ch: '\n',
                    marks: current.clone(),
                });
            }
            Token::Open { name, attrs } if is_block_tag(&name) => {
                let align = block_alignment(&attrs);
                parser.need_block = false;
                if touched {
                    parser.start_block(align);
                } else if let Some(first) = parser.aligns.first_mut() {
                    *first = align;
                }
                touched = true;
            }
            Token::Close { name } if is_block_tag(&name) => {
                parser.need_block = true;
            }
            Token::Open { name, attrs } => {
                stack.push((name.clone(), current.clone()));
                marks_for_tag(&name, &attrs, &mut current);
            }
            Token::Close { name } => {
                if let Some(pos) = stack.iter().rposition(|(open, _)| *open == name) {
                    current = stack[pos].1.clone();
                    stack.truncate(pos);
                }
            }
        }
    }
    parser.finish_block();
    (parser.cells, parser.aligns)
}
