use std::future::Future;

use crate::html;

/// Everything a PDF renderer needs: the printable fragment and a file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfJob {
    pub fragment: String,
    pub filename: String,
}

impl PdfJob {
    pub fn new(title: &str, content_html: &str, untitled: &str) -> Self {
        let title = match title.trim() {
            "" => untitled,
            trimmed => trimmed,
        };
        let fragment = format!(
            "<div style=\"padding: 20px; font-family: Arial;\">\
             <h1 style=\"border-bottom: 2px solid #333;\">{}</h1>\
             <div style=\"font-size: 14px; line-height: 1.6;\">{}</div>\
             </div>",
            html::escape_text(title),
            content_html
        );
        Self {
            fragment,
            filename: format!("{}.pdf", safe_file_stem(title)),
        }
    }
}

fn safe_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PDF export is not available")]
    Unavailable,
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

/// Renders a fragment into a downloaded PDF.
pub trait PdfRenderer {
    fn render(&self, job: PdfJob) -> impl Future<Output = Result<(), ExportError>>;
}
