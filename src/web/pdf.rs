use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::js_error;
use crate::export::{ExportError, PdfJob, PdfRenderer};

#[wasm_bindgen]
extern "C" {
    type Html2PdfWorker;

    #[wasm_bindgen(catch, js_name = html2pdf)]
    fn html2pdf() -> Result<Html2PdfWorker, JsValue>;

    #[wasm_bindgen(method)]
    fn set(this: &Html2PdfWorker, options: &JsValue) -> Html2PdfWorker;

    #[wasm_bindgen(method, js_name = from)]
    fn from_element(this: &Html2PdfWorker, source: &web_sys::Element) -> Html2PdfWorker;

    #[wasm_bindgen(method)]
    fn save(this: &Html2PdfWorker) -> js_sys::Promise;
}

#[derive(Serialize)]
struct PdfOptions<'a> {
    margin: u32,
    filename: &'a str,
    html2canvas: CanvasOptions,
    #[serde(rename = "jsPDF")]
    js_pdf: PageOptions,
}

#[derive(Serialize)]
struct CanvasOptions {
    scale: u32,
}

#[derive(Serialize)]
struct PageOptions {
    unit: &'static str,
    format: &'static str,
}

/// Renders through the page-global `html2pdf` bundle.
pub struct Html2Pdf;

impl PdfRenderer for Html2Pdf {
    async fn render(&self, job: PdfJob) -> Result<(), ExportError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(ExportError::Unavailable)?;
        let element = document
            .create_element("div")
            .map_err(|err| ExportError::Render(js_error(&err)))?;
        element.set_inner_html(&job.fragment);

        let options = PdfOptions {
            margin: 10,
            filename: &job.filename,
            html2canvas: CanvasOptions { scale: 2 },
            js_pdf: PageOptions {
                unit: "mm",
                format: "a4",
            },
        };
        let options = options
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| ExportError::Render(err.to_string()))?;

        let worker = html2pdf().map_err(|_| ExportError::Unavailable)?;
        let promise = worker.set(&options).from_element(&element).save();
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| ExportError::Render(js_error(&err)))
    }
}
