#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Save,
    New,
    Open,
    Print,
    Find,
    Bold,
    Italic,
    Underline,
}

/// Resolves a key press to a shortcut. Every shortcut needs Ctrl or Cmd.
pub fn shortcut_for(key: &str, ctrl: bool, meta: bool) -> Option<Shortcut> {
    if !(ctrl || meta) {
        return None;
    }
    match key.to_lowercase().as_str() {
        "s" => Some(Shortcut::Save),
        "n" => Some(Shortcut::New),
        "o" => Some(Shortcut::Open),
        "p" => Some(Shortcut::Print),
        "f" => Some(Shortcut::Find),
        "b" => Some(Shortcut::Bold),
        "i" => Some(Shortcut::Italic),
        "u" => Some(Shortcut::Underline),
        _ => None,
    }
}
