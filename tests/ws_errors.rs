mod support;

use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio_tungstenite::tungstenite;

// Error-path coverage over a real socket. Tests in this binary share one
// server, so assertions target requester-only replies and specific ids
// rather than global counts.

async fn connect_with_identity(base_url: &str) -> (support::Ws, String) {
    let mut ws = support::connect_ws(base_url).await;
    let identity = support::next_of_type(&mut ws, "identity").await;
    let id = identity["id"]
        .as_str()
        .expect("identity carries the connection id")
        .to_string();
    (ws, id)
}

#[tokio::test]
async fn test_out_of_range_location_is_rejected() {
    let base_url = support::ensure_server();
    let (mut ws, _id) = connect_with_identity(base_url).await;

    support::send_json(
        &mut ws,
        &json!({
            "type": "location-update",
            "data": { "lat": 123.0, "lng": 0.0, "role": "user" }
        }),
    )
    .await;

    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "lat out of range");
}

#[tokio::test]
async fn test_missing_location_fields_are_rejected() {
    let base_url = support::ensure_server();
    let (mut ws, _id) = connect_with_identity(base_url).await;

    support::send_json(
        &mut ws,
        &json!({
            "type": "location-update",
            "data": { "lng": 0.0, "role": "user" }
        }),
    )
    .await;
    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "lat is required");

    support::send_json(
        &mut ws,
        &json!({
            "type": "location-update",
            "data": { "lat": 1.0, "lng": 2.0 }
        }),
    )
    .await;
    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "role is required");
}

#[tokio::test]
async fn test_unparseable_frame_gets_an_error_reply() {
    let base_url = support::ensure_server();
    let (mut ws, _id) = connect_with_identity(base_url).await;

    support::send_json(&mut ws, &json!({ "type": "no-such-event" })).await;

    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "unrecognized message");
}

#[tokio::test]
async fn test_incomplete_ticket_is_rejected() {
    let base_url = support::ensure_server();
    let (mut ws, id) = connect_with_identity(base_url).await;

    support::send_json(
        &mut ws,
        &json!({
            "type": "create-ticket",
            "data": {
                "id": format!("t-{}", uuid::Uuid::new_v4()),
                "lat": 51.5, "lng": -0.1,
                "creatorId": id, "creatorName": "Ann"
            }
        }),
    )
    .await;

    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "message is required");
}

#[tokio::test]
async fn test_duplicate_ticket_id_is_rejected_and_the_original_survives() {
    let base_url = support::ensure_server();
    let (mut ws, id) = connect_with_identity(base_url).await;
    let ticket_id = format!("t-{}", uuid::Uuid::new_v4());

    let mut create = json!({
        "type": "create-ticket",
        "data": {
            "id": ticket_id, "lat": 51.5, "lng": -0.1, "message": "help",
            "creatorId": id, "creatorName": "Ann"
        }
    });
    support::send_json(&mut ws, &create).await;
    support::next_of_type(&mut ws, "new-ticket").await;

    create["data"]["message"] = json!("other");
    support::send_json(&mut ws, &create).await;
    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "duplicate ticket id");

    support::send_json(&mut ws, &json!({ "type": "request-tickets" })).await;
    let all = support::next_of_type(&mut ws, "all-tickets").await;
    let ticket = all
        .as_array()
        .expect("all-tickets is an array")
        .iter()
        .find(|t| t["id"] == ticket_id.as_str())
        .expect("original ticket still present")
        .clone();
    assert_eq!(ticket["message"], "help");
}

#[tokio::test]
async fn test_updating_an_unknown_ticket_reports_not_found() {
    let base_url = support::ensure_server();
    let (mut ws, _id) = connect_with_identity(base_url).await;

    support::send_json(
        &mut ws,
        &json!({
            "type": "update-ticket",
            "data": { "id": format!("t-{}", uuid::Uuid::new_v4()), "message": "text" }
        }),
    )
    .await;

    let error = support::next_of_type(&mut ws, "error").await;
    assert_eq!(error["message"], "unknown ticket id");
}

#[tokio::test]
async fn test_only_the_creator_can_update_a_ticket() {
    let base_url = support::ensure_server();
    let (mut ann, ann_id) = connect_with_identity(base_url).await;
    let (mut bob, _bob_id) = connect_with_identity(base_url).await;
    let ticket_id = format!("t-{}", uuid::Uuid::new_v4());

    support::send_json(
        &mut ann,
        &json!({
            "type": "create-ticket",
            "data": {
                "id": ticket_id, "lat": 51.5, "lng": -0.1, "message": "help",
                "creatorId": ann_id, "creatorName": "Ann"
            }
        }),
    )
    .await;
    support::next_of_type(&mut ann, "new-ticket").await;

    support::send_json(
        &mut bob,
        &json!({
            "type": "update-ticket",
            "data": { "id": ticket_id, "message": "hijacked" }
        }),
    )
    .await;
    let error = support::next_of_type(&mut bob, "error").await;
    assert_eq!(error["message"], "not the ticket creator");

    // The stored message is untouched.
    support::send_json(&mut bob, &json!({ "type": "request-tickets" })).await;
    let all = support::next_of_type(&mut bob, "all-tickets").await;
    let ticket = all
        .as_array()
        .expect("all-tickets is an array")
        .iter()
        .find(|t| t["id"] == ticket_id.as_str())
        .expect("ticket still present")
        .clone();
    assert_eq!(ticket["message"], "help");
}

#[tokio::test]
async fn test_binary_frames_close_the_connection() {
    let base_url = support::ensure_server();
    let (mut ws, _id) = connect_with_identity(base_url).await;

    futures_util::SinkExt::send(&mut ws, tungstenite::Message::Binary(vec![1, 2, 3].into()))
        .await
        .expect("ws send");

    // The server answers with a close frame and drops the socket.
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(tungstenite::Message::Close(_))) | None => break true,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break true,
            }
        }
    })
    .await
    .expect("timed out waiting for the close");
    assert!(closed);
}
