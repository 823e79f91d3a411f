//! `delete_booking` tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::{parse_input, schema_for, Tool};
use super::{BookingTools, ToolOutcome};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteBookingParams {
    #[schemars(description = "The booking identifier")]
    pub booking_id: String,

    #[schemars(description = "Name of the restaurant the booking is for")]
    pub restaurant_name: String,
}

pub struct DeleteBooking(pub BookingTools);

#[async_trait]
impl Tool for DeleteBooking {
    fn name(&self) -> &'static str {
        "delete_booking"
    }

    fn description(&self) -> &'static str {
        "Delete an existing booking by its ID and restaurant name."
    }

    fn input_schema(&self) -> Value {
        schema_for::<DeleteBookingParams>()
    }

    async fn call(&self, input: Value) -> ToolOutcome {
        match parse_input(self.name(), input) {
            Ok(params) => self.0.delete_booking(params).await,
            Err(outcome) => outcome,
        }
    }
}
