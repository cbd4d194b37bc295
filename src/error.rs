//! Error type shared by configuration parsing and the DOM glue.
//!
//! The pure core (estimator, state machine, particles) has no failure modes;
//! everything here originates from config validation or the browser.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("no global window")]
    NoWindow,
    #[error("no document on window")]
    NoDocument,
    #[error("element `{0}` not found")]
    MissingElement(String),
    #[error("canvas 2d context unavailable")]
    NoContext,
    #[error("javascript error: {0}")]
    Js(String),
    #[error("invalid card config: {0}")]
    InvalidConfig(String),
    #[error("unknown card variant `{0}`")]
    UnknownVariant(String),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ScratchError {
    /// Wrap a raw JS exception, keeping its printable form.
    pub fn js(value: JsValue) -> Self {
        let text = value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"));
        ScratchError::Js(text)
    }
}

impl From<ScratchError> for JsValue {
    fn from(err: ScratchError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScratchError>;
