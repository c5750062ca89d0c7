mod support;

#[tokio::test]
async fn test_status_reports_live_counts() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base_url}/status"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = res.json().await.expect("status body is JSON");
    assert_eq!(body["connections"], 0);
    assert_eq!(body["sessions"], 0);
    assert_eq!(body["tickets"], 0);
    assert!(body["uptimeSeconds"].is_u64());

    // A live connection is reflected in both counters. Waiting for the
    // catch-up push guarantees the relay has processed the open event.
    let mut ws = support::connect_ws(base_url).await;
    support::next_of_type(&mut ws, "all-tickets").await;

    let body: serde_json::Value = client
        .get(format!("{base_url}/status"))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("status body is JSON");
    assert_eq!(body["connections"], 1);
    assert_eq!(body["sessions"], 1);
}
