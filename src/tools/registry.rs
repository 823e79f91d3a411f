//! The [`Tool`] capability and the [`ToolRegistry`] the agent loop dispatches
//! through.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::outcome::{ToolErrorKind, ToolOutcome};
use crate::model::ToolSpec;

/// A callable with a declared input shape.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the accepted input object.
    fn input_schema(&self) -> Value;

    /// Run the tool. Failures are reported in the outcome, never raised.
    async fn call(&self, input: Value) -> ToolOutcome;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// JSON schema for a parameter struct, without the `$schema` marker.
pub fn schema_for<P: JsonSchema>() -> Value {
    let mut schema: Value = schemars::schema_for!(P).into();
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
    }
    schema
}

/// Deserialize tool input into its parameter struct.
pub fn parse_input<P: DeserializeOwned>(tool: &str, input: Value) -> Result<P, ToolOutcome> {
    serde_json::from_value(input).map_err(|e| {
        ToolOutcome::error(
            ToolErrorKind::InvalidInput,
            format!("invalid arguments for {tool}: {e}"),
        )
    })
}

/// Ordered set of tools, looked up by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        match self.index.get(name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call the named tool. Unknown names come back as `invalid_input`.
    pub async fn dispatch(&self, name: &str, input: Value) -> ToolOutcome {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = %name, "model requested unknown tool");
            return ToolOutcome::error(ToolErrorKind::InvalidInput, format!("unknown tool: {name}"));
        };

        let outcome = tool.call(input).await;
        match &outcome {
            ToolOutcome::Success { .. } => tracing::debug!(tool = %name, "tool succeeded"),
            ToolOutcome::Error { kind, message } => {
                tracing::info!(
                    tool = %name,
                    kind = ?kind,
                    message = %message,
                    "tool returned error"
                )
            }
        }
        outcome
    }
}
