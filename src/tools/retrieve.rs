//! `retrieve` tool: knowledge base passages about restaurants and menus.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::{parse_input, schema_for, Tool};
use super::{BookingTools, ToolOutcome};

/// Upper bound on passages per call.
pub const MAX_RESULTS_CAP: usize = 20;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RetrieveParams {
    #[schemars(description = "Natural language question about restaurants, menus or opening hours")]
    pub query: String,

    #[schemars(description = "Maximum number of passages to return (1-20). Defaults to 5.")]
    pub max_results: Option<usize>,
}

pub struct Retrieve(pub BookingTools);

#[async_trait]
impl Tool for Retrieve {
    fn name(&self) -> &'static str {
        "retrieve"
    }

    fn description(&self) -> &'static str {
        "Search the restaurant knowledge base (restaurant directory, menus, opening hours) \
         and return the most relevant passages."
    }

    fn input_schema(&self) -> Value {
        schema_for::<RetrieveParams>()
    }

    async fn call(&self, input: Value) -> ToolOutcome {
        match parse_input(self.name(), input) {
            Ok(params) => self.0.retrieve(params).await,
            Err(outcome) => outcome,
        }
    }
}
