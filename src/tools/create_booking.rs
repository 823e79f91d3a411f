//! `create_booking` tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::{parse_input, schema_for, Tool};
use super::{BookingTools, ToolOutcome};
use crate::booking::NewBooking;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateBookingParams {
    #[schemars(description = "Date of the booking, formatted YYYY-MM-DD")]
    pub date: String,

    #[schemars(description = "Time of the booking, formatted HH:MM")]
    pub hour: String,

    #[schemars(description = "Name of the restaurant to book")]
    pub restaurant_name: String,

    #[schemars(description = "Name of the guest the table is booked for")]
    pub guest_name: String,

    #[schemars(description = "Number of guests, at least 1")]
    pub num_guests: u32,
}

impl From<CreateBookingParams> for NewBooking {
    fn from(params: CreateBookingParams) -> Self {
        NewBooking {
            date: params.date,
            hour: params.hour,
            restaurant_name: params.restaurant_name,
            guest_name: params.guest_name,
            num_guests: params.num_guests,
        }
    }
}

pub struct CreateBooking(pub BookingTools);

#[async_trait]
impl Tool for CreateBooking {
    fn name(&self) -> &'static str {
        "create_booking"
    }

    fn description(&self) -> &'static str {
        "Create a new booking at a restaurant for a date, time, guest name and party size. \
         Returns the new booking ID."
    }

    fn input_schema(&self) -> Value {
        schema_for::<CreateBookingParams>()
    }

    async fn call(&self, input: Value) -> ToolOutcome {
        match parse_input(self.name(), input) {
            Ok(params) => self.0.create_booking(params).await,
            Err(outcome) => outcome,
        }
    }
}
