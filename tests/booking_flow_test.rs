mod helpers;

use restobot::agent::{AgentEvent, CollectSink};
use restobot::model::scripted::ScriptedProvider;
use restobot::tools::{ToolErrorKind, ToolOutcome};
use serde_json::json;

fn tool_outcomes(events: &[AgentEvent]) -> Vec<(String, ToolOutcome)> {
    events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::ToolResult { name, outcome, .. } => Some((name.clone(), outcome.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn book_lookup_cancel_lookup() {
    let tools = helpers::test_tools();

    // Ask about the restaurant, then book.
    let (agent, _) = helpers::scripted_agent(
        &tools,
        vec![
            ScriptedProvider::tool_turn("r1", "retrieve", json!({"query": "Rice & Spice"})),
            ScriptedProvider::tool_turn(
                "c1",
                "create_booking",
                json!({
                    "date": "2025-12-01",
                    "hour": "20:00",
                    "restaurant_name": "Rice & Spice",
                    "guest_name": "Anna",
                    "num_guests": 4
                }),
            ),
            ScriptedProvider::text_turn("<answer>Your table is booked.</answer>"),
        ],
    );

    let mut sink = CollectSink::default();
    let result = agent
        .run("Book Rice & Spice for 4 on 2025-12-01 at 20:00, name Anna", &mut sink)
        .await
        .unwrap();
    assert_eq!(result.turns, 3);
    assert_eq!(result.answer("answer"), "Your table is booked.");

    let outcomes = tool_outcomes(&sink.events);
    assert_eq!(outcomes[0].0, "retrieve");
    assert!(outcomes[0].1.to_text().contains("Rice & Spice"));
    assert_eq!(outcomes[1].0, "create_booking");
    let id = helpers::created_id(&outcomes[1].1);
    assert_eq!(id.len(), 8);

    // Same tools, a second conversation: look up, cancel, look up again.
    let key = json!({"booking_id": id, "restaurant_name": "Rice & Spice"});
    let (agent, _) = helpers::scripted_agent(
        &tools,
        vec![
            ScriptedProvider::tool_turn("g1", "get_booking_details", key.clone()),
            ScriptedProvider::text_turn("<answer>Found it.</answer>"),
            ScriptedProvider::tool_turn("d1", "delete_booking", key.clone()),
            ScriptedProvider::text_turn("<answer>Cancelled.</answer>"),
            ScriptedProvider::tool_turn("g2", "get_booking_details", key),
            ScriptedProvider::text_turn("<answer>No such booking.</answer>"),
        ],
    );

    let mut first = CollectSink::default();
    agent.run("What is my booking?", &mut first).await.unwrap();
    let (_, found) = &tool_outcomes(&first.events)[0];
    match found {
        ToolOutcome::Success { content } => {
            assert_eq!(content["guest_name"], "Anna");
            assert_eq!(content["num_guests"], 4);
        }
        other => panic!("expected booking, got {other:?}"),
    }

    let mut second = CollectSink::default();
    agent.run("Cancel it", &mut second).await.unwrap();
    let (_, deleted) = &tool_outcomes(&second.events)[0];
    assert_eq!(
        deleted.to_text(),
        json!({
            "booking_id": id,
            "message": format!("Booking with ID {id} deleted successfully"),
        })
        .to_string()
    );

    let mut third = CollectSink::default();
    agent.run("Is it still there?", &mut third).await.unwrap();
    let (_, missing) = &tool_outcomes(&third.events)[0];
    assert_eq!(missing.error_kind(), Some(ToolErrorKind::NotFound));
    assert_eq!(missing.to_text(), format!("No booking found with ID {id}"));

    // Three invocations, each user + assistant(tool) + user(result) + assistant.
    assert_eq!(agent.history().await.len(), 12);
}

#[tokio::test]
async fn booking_key_includes_restaurant() {
    let tools = helpers::test_tools();
    let (agent, _) = helpers::scripted_agent(
        &tools,
        vec![
            ScriptedProvider::tool_turn(
                "c1",
                "create_booking",
                json!({
                    "date": "2025-12-24",
                    "hour": "19:30",
                    "restaurant_name": "Nonna's Kitchen",
                    "guest_name": "Ben",
                    "num_guests": 2
                }),
            ),
            ScriptedProvider::text_turn("done"),
        ],
    );
    let mut sink = CollectSink::default();
    agent.run("book", &mut sink).await.unwrap();
    let id = helpers::created_id(&tool_outcomes(&sink.events)[0].1);

    let (agent, _) = helpers::scripted_agent(
        &tools,
        vec![
            ScriptedProvider::tool_turn(
                "g1",
                "get_booking_details",
                json!({"booking_id": id, "restaurant_name": "Rice & Spice"}),
            ),
            ScriptedProvider::text_turn("not there"),
        ],
    );
    let mut sink = CollectSink::default();
    agent.run("look up", &mut sink).await.unwrap();
    let (_, outcome) = &tool_outcomes(&sink.events)[0];
    assert_eq!(outcome.error_kind(), Some(ToolErrorKind::NotFound));
}

#[tokio::test]
async fn missing_arguments_are_reported_to_the_model() {
    let tools = helpers::test_tools();
    let (agent, provider) = helpers::scripted_agent(
        &tools,
        vec![
            ScriptedProvider::tool_turn(
                "c1",
                "create_booking",
                json!({"restaurant_name": "Rice & Spice", "num_guests": 2}),
            ),
            ScriptedProvider::text_turn("<answer>Which date and time?</answer>"),
        ],
    );

    let result = agent.invoke("Book Rice & Spice for 2").await.unwrap();
    assert_eq!(result.answer("answer"), "Which date and time?");

    let second = &provider.requests()[1];
    let fed_back = serde_json::to_value(second.messages.last().unwrap()).unwrap();
    assert_eq!(fed_back["content"][0]["is_error"], true);
    assert!(fed_back["content"][0]["content"]
        .as_str()
        .unwrap()
        .contains("invalid arguments for create_booking"));
}
