use super::*;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use scout_watcher::web::create_router;
use tower::ServiceExt;

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_form_page_shows_defaults() -> anyhow::Result<()> {
    let app = create_test_app_state(Vec::new());
    let router = create_router(app.state.clone());

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="search_term" value="Haimeh""#));
    assert!(html.contains(r#"name="distance_threshold" value="10""#));
    assert!(html.contains(r#"name="interval_minutes" value="5""#));
    assert!(html.contains("Stopped"));
    Ok(())
}

#[tokio::test]
async fn test_start_with_invalid_input_rerenders_form() -> anyhow::Result<()> {
    let app = create_test_app_state(Vec::new());
    let router = create_router(app.state.clone());

    let response = router
        .oneshot(form_request(
            "/start",
            "search_term=Haimeh&distance_threshold=abc&interval_minutes=5",
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Distance threshold must be a number"));
    assert!(html.contains(r#"value="abc""#));
    assert!(!app.state.scheduler.is_running().await);
    Ok(())
}

#[tokio::test]
async fn test_start_then_stop() -> anyhow::Result<()> {
    let app = create_test_app_state(table(&[&["Jita", "HS", "40"]]));
    let router = create_router(app.state.clone());

    let response = router
        .clone()
        .oneshot(form_request(
            "/start",
            "search_term=Haimeh&distance_threshold=7.5&interval_minutes=2",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let status = app.state.scheduler.status().await;
    assert_eq!(status.state, scout_watcher::SchedulerState::Running);
    let job = status.job.expect("job is scheduled");
    assert_eq!(job.distance_threshold, 7.5);
    assert_eq!(job.interval_minutes, 2);

    let response = router.oneshot(form_request("/stop", "")).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(!app.state.scheduler.is_running().await);
    Ok(())
}

#[tokio::test]
async fn test_api_status_and_health() -> anyhow::Result<()> {
    let app = create_test_app_state(Vec::new());
    let router = create_router(app.state.clone());

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/api/status").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["state"], "idle");
    assert!(json["data"]["job"].is_null());

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "scout-watcher");
    Ok(())
}

#[tokio::test]
async fn test_api_start_rejects_non_positive_interval() -> anyhow::Result<()> {
    let app = create_test_app_state(Vec::new());
    let router = create_router(app.state.clone());

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/start")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"search_term":"Haimeh","distance_threshold":"10","interval_minutes":"0"}"#,
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert!(!app.state.scheduler.is_running().await);
    Ok(())
}

#[tokio::test]
async fn test_api_start_then_stop() -> anyhow::Result<()> {
    let app = create_test_app_state(Vec::new());
    let router = create_router(app.state.clone());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/start")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"search_term":"Haimeh","distance_threshold":"10","interval_minutes":"5"}"#,
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(json["data"]["search_term"], "Haimeh");
    assert!(app.state.scheduler.is_running().await);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/stop")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(json["data"]["state"], "idle");
    Ok(())
}
