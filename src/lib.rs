pub mod codegen;
pub mod diagram;
pub mod naming;
pub mod relations;
pub mod typemap;

use wasm_bindgen::prelude::*;

use diagram::Diagram;

pub use codegen::{GeneratorOptions, generate};
pub use relations::ReferenceError;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Generate SQLAlchemy models from a diagram JSON document
#[wasm_bindgen(js_name = "diagramToSqlalchemy")]
pub fn diagram_to_sqlalchemy(source: &str, cascade: Option<String>) -> Result<String, String> {
    let parsed: Diagram = serde_json::from_str(source).map_err(|e| e.to_string())?;
    let options = GeneratorOptions { cascade };
    generate(&parsed, &options).map_err(|e| e.to_string())
}
