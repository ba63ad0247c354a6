//! Runs the real reqwest clients against an in-process stub of the YouTube
//! and Sheets APIs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use playlistsheet_core::ErrorKind;
use playlistsheet_providers::google::{ApiEndpoints, BuildStep, GoogleServices};
use serde_json::{Value, json};

const GOOD_TOKEN: &str = "ya29.good";

#[derive(Default)]
struct Recorded {
    page_tokens: Vec<Option<String>>,
    created: Option<Value>,
    written: Option<(String, String, Value)>,
    batch: Option<(String, Value)>,
}

#[derive(Clone, Default)]
struct Stub {
    recorded: Arc<Mutex<Recorded>>,
    fail_batch_with_quota: bool,
}

fn google_error(code: u16, reason: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": format!("stub error: {reason}"),
            "errors": [{"reason": reason, "domain": "global"}]
        }
    })
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", GOOD_TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(google_error(401, "authError")),
        )
            .into_response()),
    }
}

fn snippet(id: &str, title: Option<&str>) -> Value {
    let mut snippet = json!({
        "publishedAt": "2024-03-15T10:00:00Z",
        "resourceId": {"kind": "youtube#video", "videoId": id},
        "thumbnails": {"default": {"url": format!("https://i.ytimg.com/vi/{id}/default.jpg")}}
    });
    if let Some(title) = title {
        snippet["title"] = json!(title);
    }
    json!({ "snippet": snippet })
}

async fn playlist_items(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    assert_eq!(query.get("part").map(String::as_str), Some("snippet"));
    assert_eq!(query.get("maxResults").map(String::as_str), Some("50"));

    let page_token = query.get("pageToken").cloned();
    stub.recorded.lock().unwrap().page_tokens.push(page_token.clone());

    let playlist = query.get("playlistId").cloned().unwrap_or_default();
    match (playlist.as_str(), page_token.as_deref()) {
        ("PLquota", _) => (StatusCode::FORBIDDEN, Json(google_error(403, "quotaExceeded"))).into_response(),
        ("PLmissing", _) => {
            (StatusCode::NOT_FOUND, Json(google_error(404, "playlistNotFound"))).into_response()
        }
        ("PLempty", _) => Json(json!({ "items": [] })).into_response(),
        (_, None) => Json(json!({
            "items": [snippet("v1", Some("One")), snippet("v2", None), snippet("v3", Some("Three"))],
            "nextPageToken": "page2"
        }))
        .into_response(),
        (_, Some("page2")) => Json(json!({
            "items": [snippet("v4", Some("Four"))],
            "nextPageToken": ""
        }))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn create_spreadsheet(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    stub.recorded.lock().unwrap().created = Some(body.clone());
    Json(json!({
        "spreadsheetId": "1Stub",
        "properties": body["properties"],
        "sheets": [{"properties": {"sheetId": 0, "title": "Videos"}}]
    }))
    .into_response()
}

async fn update_values(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    assert_eq!(query.get("valueInputOption").map(String::as_str), Some("RAW"));
    stub.recorded.lock().unwrap().written = Some((id, range, body));
    Json(json!({"updatedRows": 1})).into_response()
}

async fn batch_update(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(target): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    if stub.fail_batch_with_quota {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(google_error(429, "rateLimitExceeded")),
        )
            .into_response();
    }
    stub.recorded.lock().unwrap().batch = Some((target, body));
    Json(json!({"replies": []})).into_response()
}

async fn start(stub: Stub) -> GoogleServices {
    let app = Router::new()
        .route("/youtube/v3/playlistItems", get(playlist_items))
        .route("/v4/spreadsheets", post(create_spreadsheet))
        .route("/v4/spreadsheets/:target", post(batch_update))
        .route("/v4/spreadsheets/:id/values/:range", put(update_values))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let endpoints = ApiEndpoints::default()
        .with_youtube_base(format!("http://{addr}/youtube/v3"))
        .with_sheets_base(format!("http://{addr}/v4"));
    GoogleServices::new(&endpoints).unwrap()
}

#[tokio::test]
async fn fetches_all_pages_and_drops_untitled_items() {
    let stub = Stub::default();
    let services = start(stub.clone()).await;

    let videos = services
        .fetcher
        .fetch_reference(GOOD_TOKEN, "https://www.youtube.com/playlist?list=PLstub")
        .await
        .unwrap();

    let ids: Vec<_> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v3", "v4"]);
    assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=v1");
    assert_eq!(videos[0].published_at.as_deref(), Some("2024-03-15T10:00:00Z"));
    let thumbnails = videos[0].thumbnails.as_ref().unwrap();
    assert_eq!(thumbnails.default, "https://i.ytimg.com/vi/v1/default.jpg");
    assert_eq!(thumbnails.high, "");

    let tokens = stub.recorded.lock().unwrap().page_tokens.clone();
    assert_eq!(tokens, vec![None, Some("page2".to_string())]);
}

#[tokio::test]
async fn remote_failures_are_classified() {
    let services = start(Stub::default()).await;

    let err = services
        .fetcher
        .fetch_reference("ya29.expired", "PLstub")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);

    let err = services
        .fetcher
        .fetch_reference(GOOD_TOKEN, "PLquota")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.reason(), Some("quotaExceeded"));

    let err = services
        .fetcher
        .fetch_reference(GOOD_TOKEN, "PLmissing")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn empty_playlist_returns_no_videos() {
    let services = start(Stub::default()).await;
    let videos = services
        .fetcher
        .fetch_reference(GOOD_TOKEN, "PLempty")
        .await
        .unwrap();
    assert!(videos.is_empty());
}

#[tokio::test]
async fn fetched_videos_build_a_formatted_sheet() {
    let stub = Stub::default();
    let services = start(stub.clone()).await;

    let videos = services
        .fetcher
        .fetch_reference(GOOD_TOKEN, "PLstub")
        .await
        .unwrap();
    let result = services
        .builder
        .build(GOOD_TOKEN, &videos, "Road trip")
        .await
        .unwrap();

    assert_eq!(result.spreadsheet_id, "1Stub");
    assert_eq!(result.video_count, 3);
    assert_eq!(
        result.spreadsheet_url,
        "https://docs.google.com/spreadsheets/d/1Stub/edit"
    );

    let recorded = stub.recorded.lock().unwrap();

    let created = recorded.created.as_ref().unwrap();
    assert_eq!(created["properties"]["title"], "YouTube Playlist: Road trip");
    assert_eq!(created["sheets"][0]["properties"]["title"], "Videos");
    assert_eq!(
        created["sheets"][0]["properties"]["gridProperties"]["rowCount"],
        4
    );

    let (id, range, body) = recorded.written.as_ref().unwrap();
    assert_eq!(id, "1Stub");
    assert_eq!(range, "Videos!A1:B4");
    let rows = body["values"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], json!(["Video Title", "Video URL"]));
    assert_eq!(rows[1], json!(["One", "https://www.youtube.com/watch?v=v1"]));

    let (target, batch) = recorded.batch.as_ref().unwrap();
    assert_eq!(target, "1Stub:batchUpdate");
    assert_eq!(batch["requests"][0]["repeatCell"]["range"]["sheetId"], 0);
    assert_eq!(
        batch["requests"][1]["autoResizeDimensions"]["dimensions"]["dimension"],
        "COLUMNS"
    );
}

#[tokio::test]
async fn formatting_failure_reports_the_spreadsheet() {
    let stub = Stub {
        fail_batch_with_quota: true,
        ..Default::default()
    };
    let services = start(stub.clone()).await;

    let videos = services
        .fetcher
        .fetch_reference(GOOD_TOKEN, "PLstub")
        .await
        .unwrap();
    let err = services
        .builder
        .build(GOOD_TOKEN, &videos, "Road trip")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartialFailure);
    assert_eq!(err.spreadsheet_id(), Some("1Stub"));
    assert_eq!(err.step(), Some(BuildStep::FormatHeader));
    assert!(stub.recorded.lock().unwrap().written.is_some());
}
