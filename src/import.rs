//! Turning a user-picked text file into note content.

use regex::Regex;
use std::sync::OnceLock;

use crate::html;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedNote {
    pub title: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read `{file_name}`: {reason}")]
    Read { file_name: String, reason: String },
}

/// Every file is taken as plain text, whatever its extension.
pub fn import_file(file_name: &str, raw: &str) -> ImportedNote {
    ImportedNote {
        title: title_from_file_name(file_name),
        content: plain_text_to_html(raw),
    }
}

/// File name without its last extension.
pub fn title_from_file_name(file_name: &str) -> String {
    static RE_EXT: OnceLock<Regex> = OnceLock::new();
    let re_ext = RE_EXT.get_or_init(|| Regex::new(r"\.[^/.]+$").unwrap());
    re_ext.replace(file_name, "").into_owned()
}

/// Escapes markup characters and turns newlines into `<br>`.
pub fn plain_text_to_html(raw: &str) -> String {
    html::escape_text(&raw.replace("\r\n", "\n")).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_last_extension() {
        assert_eq!(title_from_file_name("notes.backup.txt"), "notes.backup");
        assert_eq!(title_from_file_name("README"), "README");
        assert_eq!(title_from_file_name("dir.d/file"), "dir.d/file");
    }

    #[test]
    fn plain_text_is_escaped() {
        let imported = import_file("x.txt", "<script>alert(1)</script>\r\nnext & last");
        assert_eq!(
            imported.content,
            "&lt;script&gt;alert(1)&lt;/script&gt;<br>next &amp; last"
        );
        assert!(!imported.content.contains("<script>"));
    }

    #[test]
    fn markdown_files_are_imported_as_text() {
        let imported = import_file("notes.md", "# Title\nhello\nworld <b>x</b>");
        assert_eq!(imported.title, "notes");
        assert_eq!(
            imported.content,
            "# Title<br>hello<br>world &lt;b&gt;x&lt;/b&gt;"
        );
    }
}
