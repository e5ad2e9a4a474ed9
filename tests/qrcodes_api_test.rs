mod common;

use std::sync::Arc;

use attendance_backend::{database::MemoryStore, routes, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{test_config, TestApp, UnavailableSessions};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn admin_routes_require_a_session() {
    let app = TestApp::new();

    let (status, _, body) = app.send(Method::GET, "/api/qrcodes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _, body) = app
        .send(
            Method::GET,
            "/api/qrcodes/stats",
            Some("attendance_session=not-a-session"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid session");
}

#[tokio::test]
async fn non_admin_is_forbidden() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_in("tamu@example.com", None).await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/qrcodes",
            Some(&cookie),
            Some(r#"{"count": 3}"#),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _, _) = app.send(Method::GET, "/api/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_by_user_id_passes_the_guard() {
    let app = TestApp::new();
    let (user, cookie) = app.signed_in("ketua@example.com", None).await;

    let mut config = test_config("https://qr.example.com/render");
    config.admin_user_ids = vec![user.id.to_string()];
    let state = AppState {
        config: Arc::new(config.clone()),
        admin_policy: Arc::new(
            attendance_backend::middleware::auth::AdminPolicy::from_config(&config),
        ),
        ..app.state.clone()
    };
    let app = TestApp {
        router: routes::router(state.clone()),
        state,
    };

    let (status, _, _) = app
        .send(Method::GET, "/api/qrcodes/stats", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn session_backend_failure_is_503() {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_stores(
        test_config("https://qr.example.com/render"),
        store.clone(),
        store,
        Arc::new(UnavailableSessions),
    )
    .unwrap();
    let app = TestApp {
        router: routes::router(state.clone()),
        state,
    };

    let (status, _, body) = app
        .send(
            Method::GET,
            "/api/qrcodes",
            Some("attendance_session=whatever"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Auth unavailable"));
}

#[tokio::test]
async fn create_batch_accepts_count_aliases() {
    let app = TestApp::new();
    let (_, cookie) = app.admin().await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/qrcodes",
            Some(&cookie),
            Some(r#"{"jumlah": "3"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert_eq!(row["token"].as_str().unwrap().len(), 32);
        assert_eq!(row["hadir"], false);
        assert_eq!(row["souvenir"], false);
        assert!(row["createdAt"].is_string());
    }

    let (status, _, body) = app
        .send(Method::POST, "/api/qrcodes", Some(&cookie), Some(r#"{"count": 0}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "count harus > 0");

    let (status, _, _) = app
        .send(Method::POST, "/api/qrcodes", Some(&cookie), Some("not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_paginates_and_filters() {
    let app = TestApp::new();
    let (_, cookie) = app.admin().await;
    let created = app.state.qrcode_service.create_batch(5).await.unwrap();
    app.state
        .qrcode_service
        .check_in(&created[0].token)
        .await
        .unwrap();

    let (status, _, body) = app
        .send(Method::GET, "/api/qrcodes?page=2&limit=2", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["total"], 5);
    assert_eq!(body["pageCount"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _, body) = app
        .send(Method::GET, "/api/qrcodes?type=hadir", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["token"], created[0].token.as_str());

    let (status, _, _) = app
        .send(Method::GET, "/api/qrcodes?type=vip", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = app
        .send(Method::GET, "/api/qrcodes?page=abc&limit=0", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 50);
}

#[tokio::test]
async fn hadir_scan_flow() {
    let app = TestApp::new();
    let (_, cookie) = app.admin().await;
    let token = app.state.qrcode_service.create_batch(1).await.unwrap()[0]
        .token
        .clone();

    let body = json!({ "token": token }).to_string();
    let (status, _, first) = app
        .send(Method::POST, "/api/qrcodes/hadir", Some(&cookie), Some(&body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["hadir"], true);
    assert_eq!(first["data"]["souvenir"], false);

    let (status, _, again) = app
        .send(Method::POST, "/api/qrcodes/hadir", Some(&cookie), Some(&body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"], "Already checked in");
    assert_eq!(again["data"]["token"], token.as_str());

    let (status, _, missing) = app
        .send(
            Method::POST,
            "/api/qrcodes/hadir",
            Some(&cookie),
            Some(r#"{"qrToken": "does-not-exist"}"#),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "QR not found");

    let (status, _, _) = app
        .send(Method::POST, "/api/qrcodes/hadir", Some(&cookie), Some("{}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn souvenir_is_independent_of_hadir() {
    let app = TestApp::new();
    let (_, cookie) = app.admin().await;
    let token = app.state.qrcode_service.create_batch(1).await.unwrap()[0]
        .token
        .clone();

    let body = json!({ "token": token }).to_string();
    let (status, _, row) = app
        .send(Method::POST, "/api/qrcodes/souvenir", Some(&cookie), Some(&body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["data"]["souvenir"], true);
    assert_eq!(row["data"]["hadir"], false);

    let (status, _, again) = app
        .send(Method::POST, "/api/qrcodes/souvenir", Some(&cookie), Some(&body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"], "Souvenir already claimed");
}

#[tokio::test]
async fn scan_preflight_skips_the_guard() {
    let app = TestApp::new();

    let (status, headers, _) = app
        .send(Method::OPTIONS, "/api/qrcodes/hadir", None, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers[header::ALLOW], "POST, OPTIONS");
}

#[tokio::test]
async fn browser_preflight_gets_cors_headers() {
    let app = TestApp::new();

    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/qrcodes/hadir")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn rejected_requests_leave_storage_untouched() {
    let app = TestApp::new();
    let (_, guest) = app.signed_in("tamu@example.com", None).await;
    let token = app.state.qrcode_service.create_batch(1).await.unwrap()[0]
        .token
        .clone();
    let scan = json!({ "token": token }).to_string();

    for cookie in [None, Some("attendance_session=forged"), Some(guest.as_str())] {
        let (status, _, _) = app
            .send(Method::POST, "/api/qrcodes", cookie, Some(r#"{"count": 5}"#))
            .await;
        assert!(matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ));

        for uri in ["/api/qrcodes/hadir", "/api/qrcodes/souvenir"] {
            let (status, _, _) = app.send(Method::POST, uri, cookie, Some(&scan)).await;
            assert!(matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ));
        }
    }

    let stats = app.state.qrcode_service.stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.hadir, 0);
    assert_eq!(stats.souvenir, 0);
}

#[tokio::test]
async fn recent_and_stats_reflect_scans() {
    let app = TestApp::new();
    let (_, cookie) = app.admin().await;
    let rows = app.state.qrcode_service.create_batch(4).await.unwrap();
    app.state.qrcode_service.check_in(&rows[0].token).await.unwrap();
    app.state.qrcode_service.check_in(&rows[1].token).await.unwrap();
    app.state
        .qrcode_service
        .claim_souvenir(&rows[1].token)
        .await
        .unwrap();

    let (status, _, recent) = app
        .send(Method::GET, "/api/qrcodes/recent", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = recent["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|r| r["hadir"] == true));
    assert!(data[0]["updatedAt"].is_string());

    let (_, _, recent) = app
        .send(
            Method::GET,
            "/api/qrcodes/recent?type=souvenir&limit=1",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(recent["data"].as_array().unwrap().len(), 1);
    assert_eq!(recent["data"][0]["token"], rows[1].token.as_str());

    let (status, _, stats) = app
        .send(Method::GET, "/api/qrcodes/stats", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["total"], 4);
    assert_eq!(stats["data"]["hadir"], 2);
    assert_eq!(stats["data"]["belum"], 2);
    assert_eq!(stats["data"]["souvenir"], 1);
    assert_eq!(stats["data"]["rate"], 50.0);
}

#[tokio::test]
async fn participants_checkin_is_gone() {
    let app = TestApp::new();
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/participants/checkin",
            None,
            Some(r#"{"id": 1}"#),
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new();

    let (status, _, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, doc) = app.send(Method::GET, "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/qrcodes/hadir"].is_object());
}
