//! Capability interface over a rich-text editing backend.
//!
//! The history, selection tracking and mutation logic only ever talk to an
//! [`EditorSurface`], so the browser's contenteditable element and the
//! in-memory [`RichDocument`](crate::document::RichDocument) are
//! interchangeable.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    FontSize(FontSize),
    Link(String),
}

impl InlineStyle {
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::FontSize(_) => "fontSize",
            Self::Link(_) => "createLink",
        }
    }
}

/// HTML font size step, 1 (smallest) to 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;
    pub const NORMAL: FontSize = FontSize(3);

    pub fn new(step: u8) -> Self {
        Self(step.clamp(Self::MIN, Self::MAX))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u8>().ok().map(Self::new)
    }

    pub fn step(self) -> u8 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn command_name(self) -> &'static str {
        match self {
            Self::Left => "justifyLeft",
            Self::Center => "justifyCenter",
            Self::Right => "justifyRight",
        }
    }

    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "justifyLeft" => Some(Self::Left),
            "justifyCenter" => Some(Self::Center),
            "justifyRight" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn css_value(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }
}

pub trait EditorSurface {
    /// Handle to a position or span inside the live document.
    type Range: Clone;

    fn focus(&mut self);

    /// The live selection, wherever it currently is.
    fn live_range(&self) -> Option<Self::Range>;

    /// Whether `range` is anchored inside the editable surface.
    fn contains_range(&self, range: &Self::Range) -> bool;

    /// Replaces the live selection with `range`.
    fn set_live_range(&mut self, range: &Self::Range);

    fn apply_inline_style(&mut self, style: &InlineStyle);

    fn apply_alignment(&mut self, alignment: Alignment);

    fn insert_text(&mut self, text: &str);

    fn insert_fragment(&mut self, html: &str);

    fn select_all(&mut self);

    /// Serialized document content.
    fn content_html(&self) -> String;

    /// Replaces the whole document; previously issued ranges become stale.
    fn set_content_html(&mut self, html: &str);

    fn plain_text(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_is_clamped() {
        assert_eq!(FontSize::new(0).step(), 1);
        assert_eq!(FontSize::new(9).step(), 7);
        assert_eq!(FontSize::parse(" 5 "), Some(FontSize::new(5)));
        assert_eq!(FontSize::parse("big"), None);
    }

    #[test]
    fn alignment_commands_map_both_ways() {
        for alignment in [Alignment::Left, Alignment::Center, Alignment::Right] {
            assert_eq!(Alignment::from_command(alignment.command_name()), Some(alignment));
            assert_eq!(Alignment::from_css(alignment.css_value()), Some(alignment));
        }
        assert_eq!(Alignment::from_command("justifyFull"), None);
    }
}
