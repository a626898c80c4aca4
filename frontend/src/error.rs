use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::dom::NodeId;

#[derive(Error, Debug)]
pub enum BehaviorError {
    #[error("Required element not found: {0}")]
    MissingElement(&'static str),
    #[error("Unknown node handle: {0}")]
    UnknownNode(NodeId),
    #[error("DOM call failed: {0}")]
    Js(String),
    #[error("Browser global unavailable: {0}")]
    NoGlobal(&'static str),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl BehaviorError {
    /// Missing markup is expected on pages that leave a section out, so
    /// bootstrap logs it quietly instead of as a failure.
    pub fn is_missing_element(&self) -> bool {
        matches!(self, BehaviorError::MissingElement(_))
    }
}

impl From<JsValue> for BehaviorError {
    fn from(value: JsValue) -> Self {
        BehaviorError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

pub type Result<T> = std::result::Result<T, BehaviorError>;
