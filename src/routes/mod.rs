pub mod auth;
pub mod health;
pub mod participants;
pub mod qr;
pub mod qrcodes;
pub mod seed;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{
    dto::{
        auth_dto::{SeedPayload, SignInPayload},
        qrcode_dto::{
            CreateQrCodesPayload, QrCodeListResponse, QrCodeStats, RecentScan, TokenPayload,
        },
        user_dto::{CreateUserPayload, MeResponse, UpdateUserPayload, UserListResponse, UserSummary},
    },
    middleware::{
        auth::{require_admin, require_session},
        cors::origin_cors,
    },
    models::{
        qrcode::{QrCode, ScanKind},
        user::User,
    },
    AppState,
};

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        qrcodes::list_qrcodes,
        qrcodes::create_qrcodes,
        qrcodes::mark_hadir,
        qrcodes::mark_souvenir,
        qrcodes::recent_scans,
        qrcodes::stats,
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user,
        auth::sign_in,
        auth::sign_out,
        auth::me,
        seed::seed,
        qr::qr_image,
        participants::checkin_removed,
    ),
    components(schemas(
        QrCode,
        ScanKind,
        QrCodeListResponse,
        QrCodeStats,
        RecentScan,
        CreateQrCodesPayload,
        TokenPayload,
        User,
        UserSummary,
        UserListResponse,
        CreateUserPayload,
        UpdateUserPayload,
        MeResponse,
        SignInPayload,
        SeedPayload,
    )),
    info(title = "Attendance API", description = "QR token check-in and souvenir tracking")
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Full HTTP surface. Admin routes and `/api/me` sit behind the session guard.
pub fn router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route(
            "/api/qrcodes",
            get(qrcodes::list_qrcodes).post(qrcodes::create_qrcodes),
        )
        .route(
            "/api/qrcodes/hadir",
            post(qrcodes::mark_hadir).options(qrcodes::scan_options),
        )
        .route(
            "/api/qrcodes/souvenir",
            post(qrcodes::mark_souvenir).options(qrcodes::scan_options),
        )
        .route("/api/qrcodes/recent", get(qrcodes::recent_scans))
        .route("/api/qrcodes/stats", get(qrcodes::stats))
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let session_api = Router::new()
        .route("/api/me", get(auth::me))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/seed", post(seed::seed))
        .route("/api/qr", get(qr::qr_image))
        .route(
            "/api/participants/checkin",
            post(participants::checkin_removed),
        );

    let cors = origin_cors(&state.config.base_url);

    public_api
        .merge(session_api)
        .merge(admin_api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
