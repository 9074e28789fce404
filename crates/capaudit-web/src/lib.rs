use serde::Serialize;
use wasm_bindgen::prelude::*;

use capaudit_core::capability::Capability;
use capaudit_core::catalog;
use capaudit_core::config::{self, AuditConfig};
use capaudit_core::report::generate_validated_report;

/// Plain objects instead of JS `Map`s, so tag maps and interfaces read like JSON.
fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Run the audit over a JS array of capabilities and a config object.
/// Returns the AuditReport (camelCase keys), or null if the inputs don't parse
/// or fail validation.
#[wasm_bindgen]
pub fn audit_report(capabilities: JsValue, config: JsValue) -> JsValue {
    let caps: Vec<Capability> = match serde_wasm_bindgen::from_value(capabilities) {
        Ok(c) => c,
        Err(_) => return JsValue::NULL,
    };
    let cfg: AuditConfig = match serde_wasm_bindgen::from_value(config) {
        Ok(c) => c,
        Err(_) => return JsValue::NULL,
    };
    match generate_validated_report(&caps, &cfg) {
        Ok(report) => to_js(&report),
        Err(_) => JsValue::NULL,
    }
}

/// Validate a JS array of capabilities. Returns null when valid, otherwise
/// the error message.
#[wasm_bindgen]
pub fn validate_catalog(capabilities: JsValue) -> JsValue {
    let caps: Vec<Capability> = match serde_wasm_bindgen::from_value(capabilities) {
        Ok(c) => c,
        Err(e) => return JsValue::from_str(&e.to_string()),
    };
    match catalog::validate(&caps) {
        Ok(()) => JsValue::NULL,
        Err(e) => JsValue::from_str(&e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Bundled data
// ---------------------------------------------------------------------------

/// The bundled sample catalog as a JS array.
#[wasm_bindgen]
pub fn bundled_catalog() -> JsValue {
    match catalog::load_bundled_catalog() {
        Ok(caps) => to_js(&caps),
        Err(_) => JsValue::NULL,
    }
}

/// The bundled audit config as a JS object.
#[wasm_bindgen]
pub fn bundled_config() -> JsValue {
    match config::load_bundled_config() {
        Ok(cfg) => to_js(&cfg),
        Err(_) => JsValue::NULL,
    }
}
