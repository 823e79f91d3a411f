//! MCP surface for the booking tools.
//!
//! Exposes the same four tools the agent loop uses, so an external agent can
//! drive the booking table over stdio or streamable HTTP.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use super::create_booking::CreateBookingParams;
use super::delete_booking::DeleteBookingParams;
use super::get_booking_details::GetBookingDetailsParams;
use super::retrieve::RetrieveParams;
use super::{BookingTools, ToolOutcome};

#[derive(Clone)]
pub struct RestobotMcp {
    tool_router: ToolRouter<Self>,
    tools: BookingTools,
}

/// Successful outcomes become tool text; errors become MCP tool errors.
fn into_mcp_result(outcome: ToolOutcome) -> Result<String, String> {
    if outcome.is_success() {
        Ok(outcome.to_text())
    } else {
        Err(serde_json::to_string(&outcome).unwrap_or_else(|_| outcome.to_text()))
    }
}

#[tool_router]
impl RestobotMcp {
    pub fn new(tools: BookingTools) -> Self {
        Self {
            tool_router: Self::tool_router(),
            tools,
        }
    }

    #[tool(description = "Search the restaurant knowledge base (directory, menus, opening hours).")]
    async fn retrieve(
        &self,
        Parameters(params): Parameters<RetrieveParams>,
    ) -> Result<String, String> {
        into_mcp_result(self.tools.retrieve(params).await)
    }

    #[tool(description = "Get the details of a booking by booking ID and restaurant name.")]
    async fn get_booking_details(
        &self,
        Parameters(params): Parameters<GetBookingDetailsParams>,
    ) -> Result<String, String> {
        into_mcp_result(self.tools.get_booking_details(params).await)
    }

    #[tool(
        description = "Create a booking (date, hour, restaurant_name, guest_name, num_guests). \
                       Returns the new booking ID."
    )]
    async fn create_booking(
        &self,
        Parameters(params): Parameters<CreateBookingParams>,
    ) -> Result<String, String> {
        into_mcp_result(self.tools.create_booking(params).await)
    }

    #[tool(description = "Delete a booking by booking ID and restaurant name.")]
    async fn delete_booking(
        &self,
        Parameters(params): Parameters<DeleteBookingParams>,
    ) -> Result<String, String> {
        into_mcp_result(self.tools.delete_booking(params).await)
    }
}

#[tool_handler]
impl ServerHandler for RestobotMcp {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Restaurant booking tools. Use retrieve to look up restaurants and menus, \
                 create_booking to reserve a table, get_booking_details to look a booking up, \
                 and delete_booking to cancel it."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
