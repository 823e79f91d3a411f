pub mod create_booking;
pub mod delete_booking;
pub mod get_booking_details;
pub mod mcp;
pub mod outcome;
pub mod registry;
pub mod retrieve;

pub use outcome::{ToolErrorKind, ToolOutcome};
pub use registry::{Tool, ToolRegistry};

use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::booking::{store, BookingError, BookingKey, BookingTable, NewBooking};
use crate::knowledge::KnowledgeBase;
use create_booking::{CreateBooking, CreateBookingParams};
use delete_booking::{DeleteBooking, DeleteBookingParams};
use get_booking_details::{GetBookingDetails, GetBookingDetailsParams};
use retrieve::{Retrieve, RetrieveParams, MAX_RESULTS_CAP};

/// The booking tool handler. Holds the injected store handle, table name and
/// knowledge base; every tool call goes through here, whether it comes from
/// the agent loop or from an MCP client.
#[derive(Clone)]
pub struct BookingTools {
    db: Arc<Mutex<Connection>>,
    table: BookingTable,
    knowledge: Arc<dyn KnowledgeBase>,
    default_max_results: usize,
}

impl BookingTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        table: BookingTable,
        knowledge: Arc<dyn KnowledgeBase>,
        default_max_results: usize,
    ) -> Self {
        Self {
            db,
            table,
            knowledge,
            default_max_results,
        }
    }

    pub fn table(&self) -> &BookingTable {
        &self.table
    }

    /// All four tools, in the order they are offered to the model.
    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::new()
            .with(Retrieve(self.clone()))
            .with(GetBookingDetails(self.clone()))
            .with(CreateBooking(self.clone()))
            .with(DeleteBooking(self.clone()))
    }

    pub async fn get_booking_details(&self, params: GetBookingDetailsParams) -> ToolOutcome {
        let key = BookingKey::new(params.booking_id, params.restaurant_name);
        tracing::info!(
            booking_id = %key.booking_id,
            restaurant = %key.restaurant_name,
            "get_booking_details called"
        );

        let table = self.table.clone();
        let lookup = key.clone();
        match self
            .run_blocking(move |conn| store::get_booking(conn, &table, &lookup))
            .await
        {
            Ok(Some(booking)) => match serde_json::to_value(&booking) {
                Ok(content) => ToolOutcome::success(content),
                Err(e) => {
                    ToolOutcome::error(ToolErrorKind::Storage, format!("serialization failed: {e}"))
                }
            },
            Ok(None) => BookingError::NotFound(key.booking_id).into(),
            Err(outcome) => outcome,
        }
    }

    pub async fn create_booking(&self, params: CreateBookingParams) -> ToolOutcome {
        let new: NewBooking = params.into();
        tracing::info!(
            restaurant = %new.restaurant_name,
            date = %new.date,
            hour = %new.hour,
            num_guests = new.num_guests,
            "create_booking called"
        );

        let table = self.table.clone();
        match self
            .run_blocking(move |conn| store::create_booking(conn, &table, &new))
            .await
        {
            Ok(booking) => {
                tracing::info!(booking_id = %booking.booking_id, "booking created");
                ToolOutcome::success(json!({
                    "booking_id": booking.booking_id,
                    "message": format!("Booking created with ID {}", booking.booking_id),
                }))
            }
            Err(outcome) => outcome,
        }
    }

    pub async fn delete_booking(&self, params: DeleteBookingParams) -> ToolOutcome {
        let key = BookingKey::new(params.booking_id, params.restaurant_name);
        tracing::info!(
            booking_id = %key.booking_id,
            restaurant = %key.restaurant_name,
            "delete_booking called"
        );

        let table = self.table.clone();
        let target = key.clone();
        match self
            .run_blocking(move |conn| store::delete_booking(conn, &table, &target))
            .await
        {
            Ok(true) => ToolOutcome::success(json!({
                "booking_id": key.booking_id,
                "message": format!("Booking with ID {} deleted successfully", key.booking_id),
            })),
            Ok(false) => ToolOutcome::error(
                ToolErrorKind::NotFound,
                format!("Failed to delete booking with ID {}", key.booking_id),
            ),
            Err(outcome) => outcome,
        }
    }

    pub async fn retrieve(&self, params: RetrieveParams) -> ToolOutcome {
        if params.query.trim().is_empty() {
            return ToolOutcome::error(ToolErrorKind::InvalidInput, "query must not be empty");
        }
        let max_results = params
            .max_results
            .unwrap_or(self.default_max_results)
            .clamp(1, MAX_RESULTS_CAP);
        tracing::info!(
            kb_id = %self.knowledge.id(),
            query = %params.query,
            max_results,
            "retrieve called"
        );

        match self.knowledge.retrieve(&params.query, max_results).await {
            Ok(passages) => ToolOutcome::success(json!({
                "total": passages.len(),
                "passages": passages,
            })),
            Err(e) => {
                tracing::warn!(error = %e, "knowledge base retrieval failed");
                ToolOutcome::error(ToolErrorKind::Retrieval, e.to_string())
            }
        }
    }

    /// Run a sync store operation on the blocking pool.
    async fn run_blocking<T, F>(&self, op: F) -> Result<T, ToolOutcome>
    where
        F: FnOnce(&mut Connection) -> Result<T, BookingError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().map_err(|e| {
                ToolOutcome::error(ToolErrorKind::Storage, format!("db lock poisoned: {e}"))
            })?;
            op(&mut conn).map_err(ToolOutcome::from)
        })
        .await
        .map_err(|e| ToolOutcome::error(ToolErrorKind::Storage, format!("db task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::local::{import_text, LocalKnowledgeBase};
    use serde_json::Value;

    fn test_tools() -> BookingTools {
        let mut conn = crate::db::open_memory_database().unwrap();
        let table = BookingTable::default();
        store::ensure_table(&conn, &table).unwrap();
        import_text(
            &mut conn,
            "restaurants",
            Some("directory.md"),
            "Rice & Spice: Thai and Indian dishes, open 12:00-23:00.\n\nNonna's: Italian pasta.",
        )
        .unwrap();

        let db = Arc::new(Mutex::new(conn));
        let kb = Arc::new(LocalKnowledgeBase::new(Arc::clone(&db), "restaurants"));
        BookingTools::new(db, table, kb, 5)
    }

    fn create_params() -> CreateBookingParams {
        CreateBookingParams {
            date: "2025-12-01".into(),
            hour: "20:00".into(),
            restaurant_name: "Rice & Spice".into(),
            guest_name: "Anna".into(),
            num_guests: 4,
        }
    }

    fn booking_id(outcome: &ToolOutcome) -> String {
        match outcome {
            ToolOutcome::Success { content } => content["booking_id"].as_str().unwrap().to_string(),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_all_fields() {
        let tools = test_tools();
        let created = tools.create_booking(create_params()).await;
        let id = booking_id(&created);
        assert_eq!(id.len(), 8);

        let fetched = tools
            .get_booking_details(GetBookingDetailsParams {
                booking_id: id.clone(),
                restaurant_name: "Rice & Spice".into(),
            })
            .await;
        let ToolOutcome::Success { content } = fetched else {
            panic!("expected success");
        };
        assert_eq!(content["booking_id"], Value::String(id));
        assert_eq!(content["date"], "2025-12-01");
        assert_eq!(content["hour"], "20:00");
        assert_eq!(content["guest_name"], "Anna");
        assert_eq!(content["num_guests"], 4);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let tools = test_tools();
        let outcome = tools
            .get_booking_details(GetBookingDetailsParams {
                booking_id: "00000000".into(),
                restaurant_name: "Rice & Spice".into(),
            })
            .await;
        assert_eq!(outcome.error_kind(), Some(ToolErrorKind::NotFound));
        assert_eq!(outcome.to_text(), "No booking found with ID 00000000");
    }

    #[tokio::test]
    async fn delete_reports_success_then_failure() {
        let tools = test_tools();
        let id = booking_id(&tools.create_booking(create_params()).await);

        let params = || DeleteBookingParams {
            booking_id: id.clone(),
            restaurant_name: "Rice & Spice".into(),
        };

        let first = tools.delete_booking(params()).await;
        assert!(first.is_success());
        assert!(first.to_text().contains(&format!("Booking with ID {id} deleted successfully")));

        let second = tools.delete_booking(params()).await;
        assert_eq!(second.error_kind(), Some(ToolErrorKind::NotFound));
        assert_eq!(second.to_text(), format!("Failed to delete booking with ID {id}"));
    }

    #[tokio::test]
    async fn create_rejects_zero_guests() {
        let tools = test_tools();
        let mut params = create_params();
        params.num_guests = 0;
        let outcome = tools.create_booking(params).await;
        assert_eq!(outcome.error_kind(), Some(ToolErrorKind::InvalidInput));
    }

    #[tokio::test]
    async fn retrieve_returns_passages() {
        let tools = test_tools();
        let outcome = tools
            .retrieve(RetrieveParams {
                query: "pasta".into(),
                max_results: None,
            })
            .await;
        let ToolOutcome::Success { content } = outcome else {
            panic!("expected success");
        };
        assert_eq!(content["total"], 1);
        assert!(content["passages"][0]["text"].as_str().unwrap().contains("Nonna's"));
    }

    #[tokio::test]
    async fn retrieve_rejects_empty_query() {
        let tools = test_tools();
        let outcome = tools
            .retrieve(RetrieveParams {
                query: " ".into(),
                max_results: Some(3),
            })
            .await;
        assert_eq!(outcome.error_kind(), Some(ToolErrorKind::InvalidInput));
    }

    #[test]
    fn registry_offers_four_tools() {
        let registry = test_tools().registry();
        assert_eq!(
            registry.names(),
            vec!["retrieve", "get_booking_details", "create_booking", "delete_booking"]
        );
        for spec in registry.specs() {
            assert_eq!(spec.input_schema["type"], "object", "{} schema", spec.name);
        }
    }

    #[tokio::test]
    async fn registry_dispatch_validates_arguments() {
        let registry = test_tools().registry();
        let outcome = registry
            .dispatch("create_booking", serde_json::json!({"date": "2025-12-01"}))
            .await;
        assert_eq!(outcome.error_kind(), Some(ToolErrorKind::InvalidInput));
    }
}
