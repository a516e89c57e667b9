//! HTTP surface of the syncbridge server.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestServer;
use serde_json::json;

#[tokio::test]
async fn anonymous_sign_in_is_stable_per_session() {
    let server = TestServer::new().await;

    let request = Request::post("/auth/anonymous").body(Body::empty()).unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_owned();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let first: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(first["uid"].is_string());

    let request = Request::post("/auth/anonymous")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = server.send(request).await;
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let second: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(first["uid"], second["uid"]);

    let (_, stranger) = server.json("POST", "/auth/anonymous", None).await;
    assert_ne!(first["uid"], stranger["uid"]);
}

#[tokio::test]
async fn new_room_hands_out_a_share_link() {
    let server = TestServer::new().await;

    let (status, body) = server.json("GET", "/r/new", None).await;
    assert_eq!(status, StatusCode::OK);
    let room = body["room"].as_str().unwrap();
    assert_eq!(room.len(), 6);
    assert_eq!(
        body["link"].as_str().unwrap(),
        format!("http://sync.test?room={room}")
    );
}

#[tokio::test]
async fn room_lifecycle() {
    let server = TestServer::new().await;

    let (status, body) = server.json("GET", "/r/482913", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, _) = server
        .json("POST", "/r/482913/update", Some(json!({ "text": "nope" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server
        .json("PATCH", "/r/482913", Some(json!({ "text": "hello" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "hello");
    assert_eq!(body["version"], 1);

    let file = json!({
        "name": "a.txt",
        "mimeType": "text/plain",
        "url": "http://sync.test/blobs/uploads/482913/1_a.txt",
        "storagePath": "uploads/482913/1_a.txt",
        "size": 3,
        "uploadedAt": 1
    });
    let (status, body) = server
        .json(
            "POST",
            "/r/482913/update",
            Some(json!({ "files": { "op": "append", "value": file } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "hello");
    assert_eq!(body["files"].as_array().unwrap().len(), 1);

    let (status, body) = server
        .json(
            "PUT",
            "/r/482913",
            Some(json!({ "text": "", "files": { "op": "set", "value": [] } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "");
    assert!(body["files"].as_array().unwrap().is_empty());
    assert_eq!(body["version"], 3);

    let (_, body) = server.json("GET", "/r/482913", None).await;
    assert_eq!(body["version"], 3);
}

#[tokio::test]
async fn malformed_codes_are_rejected() {
    let server = TestServer::new().await;

    let (status, _) = server.json("GET", "/r/48291", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.json("GET", "/r/48291x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blobs_round_trip_and_delete() {
    let server = TestServer::new().await;
    let path = "/blobs/uploads/482913/1700000000000_notes.txt";

    let request = Request::put(path).body(Body::from("abc")).unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let stored: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stored["url"], format!("http://sync.test{path}"));

    let response = server.send(Request::get(path).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"abc");

    let response = server.send(Request::delete(path).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.send(Request::get(path).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blobs_outside_a_room_are_refused() {
    let server = TestServer::new().await;

    let request = Request::put("/blobs/elsewhere/file.txt").body(Body::from("abc")).unwrap();
    assert_eq!(server.send(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_blob_bodies_are_refused() {
    let server = TestServer::new().await;

    let request = Request::put("/blobs/uploads/482913/1_big.bin")
        .body(Body::from(vec![0u8; 2048]))
        .unwrap();
    assert_eq!(server.send(request).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn deep_link_redirects_into_the_room() {
    let server = TestServer::new().await;

    let response = server
        .send(Request::get("/?room=482913").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/r/482913");

    let response = server
        .send(Request::get("/?room=abc").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn blob_names_may_contain_dot_runs() {
    let server = TestServer::new().await;

    let request = Request::put("/blobs/uploads/482913/1_notes..txt")
        .body(Body::from("abc"))
        .unwrap();
    assert_eq!(server.send(request).await.status(), StatusCode::OK);

    let request = Request::put("/blobs/uploads/482913/..")
        .body(Body::from("abc"))
        .unwrap();
    assert_eq!(server.send(request).await.status(), StatusCode::BAD_REQUEST);
}
