//! WASM bindings for in-browser highlighting and document parsing.
//!
//! The reader page calls into these after it has rendered page content.

use wasm_bindgen::prelude::*;

use crate::highlight::{HighlightOptions, PageView};
use crate::import::{self, ParseOptions};
use crate::normalize;
use crate::reader::Navigation;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Result of highlighting a page's HTML.
#[wasm_bindgen]
pub struct Highlighted {
    html: String,
    count: usize,
}

#[wasm_bindgen]
impl Highlighted {
    #[wasm_bindgen(getter)]
    pub fn html(&self) -> String {
        self.html.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Highlight `term` in the page HTML.
///
/// `marker_class` overrides the default marker class when non-empty.
#[wasm_bindgen]
pub fn highlight_html(html: &str, term: &str, marker_class: Option<String>) -> Highlighted {
    let mut options = HighlightOptions::default();
    if let Some(class) = marker_class.filter(|c| !c.trim().is_empty()) {
        options.marker_class = class;
    }
    let mut view = PageView::new(html, options);
    let count = view.highlight(term);
    Highlighted {
        html: view.html(),
        count,
    }
}

/// Fold a string for script-insensitive comparison.
#[wasm_bindgen]
pub fn normalize_text(text: &str) -> String {
    normalize::normalize(text)
}

/// Highlight term carried by a URL query, if any.
#[wasm_bindgen]
pub fn highlight_from_query(query: &str) -> Option<String> {
    Navigation::from_query(query).highlight
}

/// Split a `.docx` or `.doc` upload into pages.
///
/// Returns the pages as a JSON array of `{page_number, content, title}`.
#[wasm_bindgen]
pub fn parse_document(data: &[u8], extension: &str) -> Result<String, JsValue> {
    let pages = import::parse(data, extension, &ParseOptions::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&pages).map_err(|e| JsValue::from_str(&e.to_string()))
}
