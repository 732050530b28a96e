use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod chat_ui;
mod dom;
mod endpoint;
mod sidebar;
mod speech;
mod storage;
mod utils;

pub use endpoint::{FetchEndpoint, GlooTimer};
pub use storage::LocalStorage;

/// Initialize the WASM application
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    wasm_logger::init(wasm_logger::Config::default());

    log::info!("SageChat WASM initialized");
}

/// Mount the chat page
#[wasm_bindgen]
pub fn init_chat_app() -> Result<(), JsValue> {
    log::info!("Initializing chat page");
    chat_ui::ChatApp::new()?.start()
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
