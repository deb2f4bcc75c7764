#![deny(unsafe_code)]

pub mod handlers;

use acct_core::{
    AccountingEngine, AcctError, AuthConfig, Authenticator, Session, SessionStage, SessionStore,
    StorageConfig, StorageError,
};
use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use handlers::{applications, auth, ledger, legal_entities, partners, queries};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "acct_session";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub session_ttl: chrono::Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::Memory,
            auth: AuthConfig::default(),
            session_ttl: chrono::Duration::hours(acct_core::session::DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

#[derive(Clone)]
pub struct ServiceState {
    pub engine: Arc<AccountingEngine>,
    pub auth: Arc<Authenticator>,
    pub sessions: Arc<SessionStore>,
}

impl ServiceState {
    pub async fn bootstrap(config: ServiceConfig) -> Result<Self, ServiceError> {
        let ServiceConfig {
            storage,
            auth,
            session_ttl,
        } = config;
        let store = storage.bootstrap().await?;

        Ok(Self {
            engine: Arc::new(AccountingEngine::new(store.clone())),
            auth: Arc::new(Authenticator::new(store, auth)),
            sessions: Arc::new(SessionStore::new(session_ttl)),
        })
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        // auth
        .route("/sign-up", post(auth::sign_up))
        .route("/verify_otp/", post(auth::verify_enrollment))
        .route("/generate_qr_code/", get(auth::generate_qr_code))
        .route("/show_qr_code/", get(auth::show_qr_code))
        .route("/login/", post(auth::login))
        .route("/verify_otp_login/", post(auth::verify_login))
        .route("/logout/", post(auth::logout))
        // partners
        .route("/partner/new/", post(partners::create))
        .route("/partner/list/", get(partners::list))
        .route("/partner/:id/", get(partners::read).post(partners::update))
        .route("/partner/:id/delete/", post(partners::delete))
        // legal entities
        .route("/legal_entity/new/", post(legal_entities::create))
        .route("/legal_entity/list/", get(legal_entities::list))
        .route(
            "/legal_entity/:id/",
            get(legal_entities::read).post(legal_entities::update),
        )
        .route("/legal_entity/:id/delete/", post(legal_entities::delete))
        // applications
        .route("/application/new/", post(applications::create))
        .route("/application/list/", get(applications::list))
        .route("/application/failure/", get(applications::failure))
        .route(
            "/application/:id/",
            get(applications::read).post(applications::update),
        )
        .route("/application/:id/delete/", post(applications::delete))
        // ledger
        .route("/income/new/", post(ledger::create_income))
        .route("/income/list/", get(ledger::list_incomes))
        .route(
            "/income/:id/",
            get(ledger::read_income).post(ledger::update_income),
        )
        .route("/income/:id/delete/", post(ledger::delete_income))
        .route("/outcome/new/", post(ledger::create_outcome))
        .route("/outcome/list/", get(ledger::list_outcomes))
        .route(
            "/outcome/:id/",
            get(ledger::read_outcome).post(ledger::update_outcome),
        )
        .route("/outcome/:id/delete/", post(ledger::delete_outcome))
        // selection and reconciliation queries
        .route("/api/legal_entities/", get(queries::legal_entities))
        .route("/api/partners/", get(queries::partners))
        .route("/api/discrepancy/", get(queries::discrepancy))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage bootstrap error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error(transparent)]
    Core(#[from] AcctError),
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
            ApiError::Core(AcctError::Validation(fields)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": "validation failed", "fields": fields })),
            )
                .into_response(),
            ApiError::Core(err) => {
                let status = match &err {
                    AcctError::NotFound { .. } => StatusCode::NOT_FOUND,
                    AcctError::Conflict(_) => StatusCode::CONFLICT,
                    AcctError::InvalidCredentials
                    | AcctError::InvalidOtp
                    | AcctError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    _ => {
                        error!(error = %err, "request failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
            }
        }
    }
}

/// Unwrap a JSON body, answering malformed input with a JSON 400.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    Ok(payload?.0)
}

/// Unwrap query parameters, answering malformed input with a JSON 400.
pub(crate) fn params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    Ok(query?.0)
}

pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

pub(crate) fn with_session_cookie(jar: CookieJar, token: String) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub(crate) fn without_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Operator with an authenticated session. Gates every record route.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<ServiceState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AcctError::Unauthenticated)?;
        let session = state
            .sessions
            .require(&token, SessionStage::Authenticated)?;
        Ok(Self {
            user_id: session.user_id,
            session,
        })
    }
}

/// Live session in any stage. Handlers decide which stages they serve.
#[derive(Debug, Clone)]
pub struct AnySession(pub Session);

#[async_trait]
impl FromRequestParts<ServiceState> for AnySession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AcctError::Unauthenticated)?;
        let session = state
            .sessions
            .get(&token)?
            .ok_or(AcctError::Unauthenticated)?;
        Ok(Self(session))
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    storage_backend: &'static str,
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "acct-service",
        storage_backend: state.engine.backend_label(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn state() -> ServiceState {
        ServiceState::bootstrap(ServiceConfig::default())
            .await
            .unwrap()
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        payload: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = cookie {
            request = request.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
        }
        let body = match payload {
            Some(payload) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };
        app.clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn cookie_token(response: &Response) -> String {
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap();
        let pair = raw.split(';').next().unwrap();
        let (name, value) = pair.split_once('=').unwrap();
        assert_eq!(name, SESSION_COOKIE);
        value.to_string()
    }

    async fn current_code(state: &ServiceState, user_id: &str) -> String {
        let user = state
            .auth
            .user(Uuid::parse_str(user_id).unwrap())
            .await
            .unwrap();
        state
            .auth
            .totp(&user)
            .unwrap()
            .generate_current()
            .unwrap()
    }

    /// Sign up and confirm enrollment; returns the authenticated token.
    async fn signed_in(state: &ServiceState, app: &Router) -> String {
        let response = send(
            app,
            "POST",
            "/sign-up",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let pending = cookie_token(&response);
        let body = json_body(response).await;
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let code = current_code(state, &user_id).await;
        let response = send(
            app,
            "POST",
            "/verify_otp/",
            Some(&pending),
            Some(json!({ "otp": code })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        cookie_token(&response)
    }

    async fn create(app: &Router, token: &str, uri: &str, payload: Value) -> Value {
        let response = send(app, "POST", uri, Some(token), Some(payload)).await;
        assert_eq!(response.status(), StatusCode::CREATED, "POST {uri}");
        json_body(response).await
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let app = build_router(state().await);
        let response = send(&app, "GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["storage_backend"], "memory");
    }

    #[tokio::test]
    async fn record_routes_require_authenticated_session() {
        let state = state().await;
        let app = build_router(state.clone());

        let response = send(&app, "GET", "/partner/list/", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // A password alone yields only a pending session.
        send(
            &app,
            "POST",
            "/sign-up",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        let response = send(
            &app,
            "POST",
            "/login/",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let pending = cookie_token(&response);

        let response = send(&app, "GET", "/partner/list/", Some(&pending), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            "POST",
            "/verify_otp_login/",
            Some(&pending),
            Some(json!({ "otp": "000000x" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Invalid OTP");
    }

    #[tokio::test]
    async fn login_with_password_and_code_then_logout() {
        let state = state().await;
        let app = build_router(state.clone());
        signed_in(&state, &app).await;

        let response = send(
            &app,
            "POST",
            "/login/",
            None,
            Some(json!({ "username": "operator", "password": "wrong-horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            "POST",
            "/login/",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        let pending = cookie_token(&response);
        let user = state
            .auth
            .authenticate("operator", "correct-horse")
            .await
            .unwrap();
        let code = state.auth.totp(&user).unwrap().generate_current().unwrap();

        let response = send(
            &app,
            "POST",
            "/verify_otp_login/",
            Some(&pending),
            Some(json!({ "otp": code })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = cookie_token(&response);

        let response = send(&app, "GET", "/partner/list/", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "POST", "/logout/", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, "GET", "/partner/list/", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn enrollment_material_is_served_during_sign_up() {
        let state = state().await;
        let app = build_router(state.clone());
        let response = send(
            &app,
            "POST",
            "/sign-up",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        let pending = cookie_token(&response);

        let response = send(&app, "GET", "/generate_qr_code/", Some(&pending), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["otpauth_url"]
            .as_str()
            .unwrap()
            .starts_with("otpauth://totp/"));

        let response = send(&app, "GET", "/show_qr_code/", Some(&pending), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
    }

    #[tokio::test]
    async fn password_only_login_cannot_reach_enrollment_material() {
        let state = state().await;
        let app = build_router(state.clone());
        let response = send(
            &app,
            "POST",
            "/sign-up",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        let enrolling = cookie_token(&response);

        let response = send(
            &app,
            "POST",
            "/login/",
            None,
            Some(json!({ "username": "operator", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let pending = cookie_token(&response);

        for uri in ["/generate_qr_code/", "/show_qr_code/"] {
            let response = send(&app, "GET", uri, Some(&pending), None).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {uri}");
        }

        // Each pending stage is only accepted by its own verification route.
        let user = state
            .auth
            .authenticate("operator", "correct-horse")
            .await
            .unwrap();
        let code = state.auth.totp(&user).unwrap().generate_current().unwrap();
        let response = send(
            &app,
            "POST",
            "/verify_otp/",
            Some(&pending),
            Some(json!({ "otp": code })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = send(
            &app,
            "POST",
            "/verify_otp_login/",
            Some(&enrolling),
            Some(json!({ "otp": code })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            "POST",
            "/verify_otp_login/",
            Some(&pending),
            Some(json!({ "otp": code })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = cookie_token(&response);
        let response = send(&app, "GET", "/generate_qr_code/", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn application_crud_with_derived_sums() {
        let state = state().await;
        let app = build_router(state.clone());
        let token = signed_in(&state, &app).await;

        let customer = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Romashka", "role": "customer" }),
        )
        .await;
        let executor = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Vector", "role": "executor", "referral_percentage": "5" }),
        )
        .await;
        let sender = create(
            &app,
            &token,
            "/legal_entity/new/",
            json!({
                "name": "Romashka LLC",
                "partner_id": customer["id"],
                "tax_number": "7707083893"
            }),
        )
        .await;
        let receiver = create(
            &app,
            &token,
            "/legal_entity/new/",
            json!({
                "name": "Vector LLC",
                "partner_id": executor["id"],
                "tax_number": "7728168971"
            }),
        )
        .await;

        let draft = json!({
            "customer_id": customer["id"],
            "executor_id": executor["id"],
            "giving_side_id": executor["id"],
            "receiver_id": receiver["id"],
            "sender_id": sender["id"],
            "initial_sum": "10000",
            "executor_commission": "20",
            "commission_with_interest": "10",
            "settlement_sum": "1"
        });
        let application = create(&app, &token, "/application/new/", draft).await;
        assert_eq!(application["settlement_sum"], "8000.00");
        assert_eq!(application["uncargo_sum"], "9000.00");
        assert_eq!(application["referral_amount"], "500.00");
        assert_eq!(application["clean_income"], "-1500.00");

        let id = application["id"].as_str().unwrap();
        let uri = format!("/application/{id}/");
        let response = send(&app, "GET", &uri, Some(&token), None).await;
        let view = json_body(response).await;
        assert_eq!(view["customer_name"], "Romashka");
        assert_eq!(view["receiver_name"], "Vector LLC");

        let response = send(
            &app,
            "GET",
            "/application/list/?status=awaiting&min_amount=5000",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(json_body(response).await["total"], 1);

        let response = send(
            &app,
            "POST",
            &format!("/application/{id}/delete/"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let uri = format!("/application/{id}/");
        let response = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn misassigned_role_is_unprocessable() {
        let state = state().await;
        let app = build_router(state.clone());
        let token = signed_in(&state, &app).await;

        let executor = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Vector", "role": "executor" }),
        )
        .await;
        let response = send(
            &app,
            "POST",
            "/application/new/",
            Some(&token),
            Some(json!({
                "customer_id": executor["id"],
                "executor_id": executor["id"],
                "giving_side_id": executor["id"],
                "receiver_id": null,
                "sender_id": null,
                "initial_sum": "100"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["fields"]["customer_id"].is_array());
        assert!(body["fields"]["receiver_id"].is_array());
    }

    #[tokio::test]
    async fn unexpected_application_failure_redirects() {
        let state = state().await;
        let app = build_router(state.clone());
        let token = signed_in(&state, &app).await;

        let customer = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Romashka", "role": "customer" }),
        )
        .await;
        let executor = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Vector", "role": "executor" }),
        )
        .await;
        let sender = create(
            &app,
            &token,
            "/legal_entity/new/",
            json!({ "name": "Romashka LLC", "partner_id": customer["id"], "tax_number": "1" }),
        )
        .await;
        let receiver = create(
            &app,
            &token,
            "/legal_entity/new/",
            json!({ "name": "Vector LLC", "partner_id": executor["id"], "tax_number": "2" }),
        )
        .await;

        let response = send(
            &app,
            "POST",
            "/application/new/",
            Some(&token),
            Some(json!({
                "customer_id": customer["id"],
                "executor_id": executor["id"],
                "giving_side_id": executor["id"],
                "receiver_id": receiver["id"],
                "sender_id": sender["id"],
                "initial_sum": "79228162514264337593543950335",
                "executor_commission": "20"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/application/failure/"
        );
    }

    #[tokio::test]
    async fn selection_and_discrepancy_endpoints() {
        let state = state().await;
        let app = build_router(state.clone());
        let token = signed_in(&state, &app).await;

        let customer = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Romashka", "role": "customer" }),
        )
        .await;
        let executor = create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Vector", "role": "executor" }),
        )
        .await;
        create(
            &app,
            &token,
            "/legal_entity/new/",
            json!({ "name": "Vector LLC", "partner_id": executor["id"], "tax_number": "2" }),
        )
        .await;
        create(
            &app,
            &token,
            "/outcome/new/",
            json!({ "customer_id": customer["id"], "amount": "250.50" }),
        )
        .await;

        let uri = "/api/partners/?role=executor";
        let response = send(&app, "GET", uri, Some(&token), None).await;
        let body = json_body(response).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["name"], "Vector");

        let uri = format!("/api/legal_entities/?partner={}", customer["id"].as_str().unwrap());
        let response = send(&app, "GET", &uri, Some(&token), None).await;
        assert!(json_body(response).await["items"].as_array().unwrap().is_empty());

        let uri = format!(
            "/api/discrepancy/?partner={}&role=customer",
            customer["id"].as_str().unwrap()
        );
        let response = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let report = json_body(response).await;
        assert_eq!(report["ledger_total"], "250.50");
        assert_eq!(report["discrepancy"], "-250.50");

        let uri = "/api/discrepancy/?role=customer";
        let response = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            "POST",
            "/income/new/",
            Some(&token),
            Some(json!({ "executor_id": customer["id"], "amount": "10" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn duplicate_partner_is_conflict_and_bad_filter_is_bad_request() {
        let state = state().await;
        let app = build_router(state.clone());
        let token = signed_in(&state, &app).await;

        create(
            &app,
            &token,
            "/partner/new/",
            json!({ "name": "Romashka", "role": "customer" }),
        )
        .await;
        let response = send(
            &app,
            "POST",
            "/partner/new/",
            Some(&token),
            Some(json!({ "name": "Romashka", "role": "executor" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let uri = "/partner/list/?role=vendor";
        let response = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
