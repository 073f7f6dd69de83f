//! Response wrapper composition.
//!
//! A wrapper is a JSON document in which exactly one string value equals
//! the configured placeholder. That node is swapped for the payload and the
//! rest of the document is passed through untouched.

use serde_json::Value;

use crate::domain::{MockError, ResponseWrapper};

pub const DEFAULT_PLACEHOLDER: &str = "__PAYLOAD__";

#[derive(Debug, Clone)]
pub struct Compositor {
    placeholder: String,
}

impl Compositor {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Without a wrapper the payload is the body.
    pub fn compose(
        &self,
        payload: Value,
        wrapper: Option<&ResponseWrapper>,
    ) -> Result<Value, MockError> {
        match wrapper {
            None => Ok(payload),
            Some(wrapper) => self.compose_template(payload, &wrapper.id, &wrapper.json),
        }
    }

    pub fn compose_template(
        &self,
        payload: Value,
        wrapper_id: &str,
        template: &str,
    ) -> Result<Value, MockError> {
        let mut document: Value =
            serde_json::from_str(template).map_err(|e| MockError::InvalidWrapperTemplate {
                wrapper_id: wrapper_id.to_string(),
                reason: e.to_string(),
            })?;

        let found = self.count_placeholders(&document);
        if found != 1 {
            return Err(MockError::WrapperPlaceholder {
                wrapper_id: wrapper_id.to_string(),
                placeholder: self.placeholder.clone(),
                found,
            });
        }

        let mut payload = Some(payload);
        self.substitute(&mut document, &mut payload);
        Ok(document)
    }

    fn is_placeholder(&self, value: &Value) -> bool {
        matches!(value, Value::String(s) if *s == self.placeholder)
    }

    fn count_placeholders(&self, value: &Value) -> usize {
        if self.is_placeholder(value) {
            return 1;
        }
        match value {
            Value::Array(items) => items.iter().map(|v| self.count_placeholders(v)).sum(),
            Value::Object(map) => map.values().map(|v| self.count_placeholders(v)).sum(),
            _ => 0,
        }
    }

    fn substitute(&self, value: &mut Value, payload: &mut Option<Value>) {
        if self.is_placeholder(value) {
            if let Some(payload) = payload.take() {
                *value = payload;
            }
            return;
        }
        match value {
            Value::Array(items) => items.iter_mut().for_each(|v| self.substitute(v, payload)),
            Value::Object(map) => map.values_mut().for_each(|v| self.substitute(v, payload)),
            _ => {}
        }
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}
