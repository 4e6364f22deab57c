//! The structured-output coercion seam.
//!
//! Free text from a model is coerced into a validated structured value.
//! Used by the composition generator to parse its decision and by the
//! output-parsing participant. Implementations range from the local
//! [`JsonCoercer`] to model-backed repair loops; the engine only sees the
//! trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from structured-output coercion.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CoercionError {
    /// No structured value could be extracted from the text.
    #[error("unparsable output: {0}")]
    Unparsable(String),

    /// A value was extracted but did not match the target shape.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Coerce free text into a structured JSON value.
///
/// `schema` is a JSON Schema describing the target shape; implementations
/// may use it to steer a repair model or ignore it entirely.
#[async_trait]
pub trait Coercer: Send + Sync {
    /// Extract a structured value from `text`.
    async fn coerce(
        &self,
        text: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, CoercionError>;
}

/// Deserialize a coerced value into a concrete type.
pub fn coerce_into<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, CoercionError> {
    serde_json::from_value(value).map_err(|e| CoercionError::SchemaMismatch(e.to_string()))
}

/// Local coercer: cut the text down to its outermost JSON object and parse.
///
/// Models often wrap JSON in prose or code fences; everything before the
/// first `{` and after the last `}` is discarded before parsing. The schema
/// argument is not consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCoercer;

impl JsonCoercer {
    /// Create a new `JsonCoercer`.
    pub fn new() -> Self {
        Self
    }

    fn cut_to_object(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }
        Some(&text[start..=end])
    }
}

#[async_trait]
impl Coercer for JsonCoercer {
    async fn coerce(
        &self,
        text: &str,
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, CoercionError> {
        let cut = Self::cut_to_object(text)
            .ok_or_else(|| CoercionError::Unparsable("no JSON object found".into()))?;
        serde_json::from_str(cut).map_err(|e| CoercionError::Unparsable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn cuts_surrounding_prose() {
        let text = "Sure! Here is the JSON:\n```json\n{\"a\": 1}\n```\nHope that helps.";
        let value = JsonCoercer::new().coerce(text, &json!({})).await.unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[tokio::test]
    async fn rejects_text_without_object() {
        let err = JsonCoercer::new().coerce("no json here", &json!({})).await;
        assert!(matches!(err, Err(CoercionError::Unparsable(_))));
    }

    #[tokio::test]
    async fn rejects_malformed_object() {
        let err = JsonCoercer::new().coerce("{not valid}", &json!({})).await;
        assert!(matches!(err, Err(CoercionError::Unparsable(_))));
    }

    #[test]
    fn coerce_into_reports_shape_errors() {
        #[derive(serde::Deserialize)]
        struct Target {
            #[allow(dead_code)]
            name: String,
        }
        let err = coerce_into::<Target>(json!({"name": 42}));
        assert!(matches!(err, Err(CoercionError::SchemaMismatch(_))));
    }
}
