//! Tools handed to the executor alongside a transduction.
//!
//! A [`Tool`] is an async callable over JSON values. The engine never calls
//! tools itself; it carries them on the spec so that an executor can expose
//! them to the model it drives.

use crate::error::TransductionResult;
use crate::handler::BoxFuture;
use atype::SchemaRef;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{trace, warn};

/// Future returned by a tool invocation.
pub type ToolFuture = BoxFuture<Value>;

type ToolFn = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// A named async callable available to the executor.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: Option<Value>,
    handler: ToolFn,
}

impl Tool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransductionResult<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Describe the tool's arguments with a schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: &SchemaRef) -> Self {
        self.input_schema = Some(schema.to_json_schema());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema of the tool's arguments, if declared.
    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    /// Invoke the tool.
    pub async fn invoke(&self, args: Value) -> TransductionResult<Value> {
        trace!(tool = %self.name, "Invoking tool");
        (self.handler)(args).await.inspect_err(|e| {
            warn!(tool = %self.name, error_code = %e.code, "Tool invocation failed");
        })
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransductionError;
    use serde_json::json;

    #[tokio::test]
    async fn test_tool_invocation() {
        let add = Tool::new("add", "Add two numbers", |args: Value| async move {
            let a = args["a"].as_i64().unwrap_or_default();
            let b = args["b"].as_i64().unwrap_or_default();
            Ok(json!(a + b))
        });

        assert_eq!(add.name(), "add");
        assert_eq!(add.invoke(json!({ "a": 2, "b": 3 })).await.unwrap(), json!(5));
    }

    #[tokio::test]
    async fn test_tool_errors_propagate() {
        let failing = Tool::new("fail", "Always fails", |_args: Value| async move {
            Err::<Value, _>(TransductionError::executor("boom"))
        });
        let err = failing.invoke(Value::Null).await.unwrap_err();
        assert_eq!(err.message, "boom");
        assert!(format!("{failing:?}").contains("fail"));
    }
}
