//! Browser bindings for the editing core.

pub mod dom;
pub mod local_storage;
pub mod logging;
pub mod pdf;

use chrono::{DateTime, Utc};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::clock::Clock;
use crate::import::ImportError;

pub use dom::DomSurface;
pub use local_storage::{BrowserStore, LocalStorageStore};
pub use pdf::Html2Pdf;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["navigator", "clipboard"], js_name = readText)]
    async fn read_clipboard_text() -> Result<JsValue, JsValue>;
}

pub(crate) fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Reads plain text from the async clipboard. Fails when the API is missing
/// or the user denied the permission prompt.
pub async fn read_clipboard() -> Result<String, String> {
    let value = read_clipboard_text().await.map_err(|err| js_error(&err))?;
    value
        .as_string()
        .ok_or_else(|| "clipboard returned no text".to_string())
}

pub async fn read_file_text(file: &web_sys::File) -> Result<String, ImportError> {
    let failed = |reason: String| ImportError::Read {
        file_name: file.name(),
        reason,
    };
    let text = JsFuture::from(file.text())
        .await
        .map_err(|err| failed(js_error(&err)))?;
    text.as_string()
        .ok_or_else(|| failed("file is not text".to_string()))
}

pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }

    fn local_date_string(&self) -> String {
        js_sys::Date::new_0()
            .to_locale_string("default", &JsValue::UNDEFINED)
            .into()
    }

    fn local_time_string(&self) -> String {
        js_sys::Date::new_0().to_locale_time_string("default").into()
    }
}
