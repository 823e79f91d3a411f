//! `get_booking_details` tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::{parse_input, schema_for, Tool};
use super::{BookingTools, ToolOutcome};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetBookingDetailsParams {
    #[schemars(description = "The booking identifier")]
    pub booking_id: String,

    #[schemars(description = "Name of the restaurant the booking is for")]
    pub restaurant_name: String,
}

pub struct GetBookingDetails(pub BookingTools);

#[async_trait]
impl Tool for GetBookingDetails {
    fn name(&self) -> &'static str {
        "get_booking_details"
    }

    fn description(&self) -> &'static str {
        "Get the relevant details for a booking by its ID and restaurant name."
    }

    fn input_schema(&self) -> Value {
        schema_for::<GetBookingDetailsParams>()
    }

    async fn call(&self, input: Value) -> ToolOutcome {
        match parse_input(self.name(), input) {
            Ok(params) => self.0.get_booking_details(params).await,
            Err(outcome) => outcome,
        }
    }
}
