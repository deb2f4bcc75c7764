//! Sign-up, two-step login and enrollment routes.
//!
//! Every path into an authenticated session goes through a one-time code:
//! sign-up and password login only ever hand out a pending session. The two
//! pending stages are kept apart so a password alone never reaches the
//! enrollment secret.

use crate::{
    body, session_token, with_session_cookie, without_session_cookie, AnySession, ApiError,
    ServiceState,
};
use acct_core::{AcctError, Provisioning, Registration, Session, SessionStage, User};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub user: User,
    /// Route the client should call next.
    pub next: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpRequest {
    pub otp: String,
}

pub async fn sign_up(
    State(state): State<ServiceState>,
    jar: CookieJar,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let user = state.auth.register(body(payload)?).await?;
    let session = state.sessions.start_enrollment(user.id)?;
    Ok((
        StatusCode::CREATED,
        with_session_cookie(jar, session.token),
        Json(AuthResponse {
            status: "otp_enrollment_required",
            user,
            next: "/generate_qr_code/",
        }),
    ))
}

pub async fn login(
    State(state): State<ServiceState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let LoginRequest { username, password } = body(payload)?;
    let purged = state.sessions.purge_expired()?;
    if purged > 0 {
        info!(purged, "dropped expired sessions");
    }

    let user = state.auth.authenticate(&username, &password).await?;
    let user = state.auth.ensure_otp_secret(user).await?;
    let session = state.sessions.start_pending(user.id)?;
    Ok((
        with_session_cookie(jar, session.token),
        Json(AuthResponse {
            status: "otp_required",
            user,
            next: "/verify_otp_login/",
        }),
    ))
}

pub async fn verify_enrollment(
    state: State<ServiceState>,
    session: AnySession,
    jar: CookieJar,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    verify(state, session, SessionStage::PendingEnrollment, jar, payload).await
}

pub async fn verify_login(
    state: State<ServiceState>,
    session: AnySession,
    jar: CookieJar,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    verify(state, session, SessionStage::PendingOtp, jar, payload).await
}

async fn verify(
    State(state): State<ServiceState>,
    AnySession(pending): AnySession,
    stage: SessionStage,
    jar: CookieJar,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    if pending.stage != stage {
        return Err(AcctError::Unauthenticated.into());
    }
    let OtpRequest { otp } = body(payload)?;
    let user = state.auth.user(pending.user_id).await?;

    // A wrong code leaves the pending session in place for another try.
    state.auth.verify_otp(&user, &otp)?;

    let session = state.sessions.promote(&pending.token, stage)?;
    info!(user_id = %user.id, "user authenticated");
    Ok((
        with_session_cookie(jar, session.token),
        Json(AuthResponse {
            status: "authenticated",
            user,
            next: "/application/list/",
        }),
    ))
}

/// Enrollment material is for accounts mid sign-up or already logged in,
/// never for a login that has only passed the password check.
fn enrollment_session(session: &Session) -> Result<(), ApiError> {
    match session.stage {
        SessionStage::PendingEnrollment | SessionStage::Authenticated => Ok(()),
        SessionStage::PendingOtp => Err(AcctError::Unauthenticated.into()),
    }
}

pub async fn generate_qr_code(
    State(state): State<ServiceState>,
    AnySession(session): AnySession,
) -> Result<Json<Provisioning>, ApiError> {
    enrollment_session(&session)?;
    let user = state.auth.user(session.user_id).await?;
    let user = state.auth.ensure_otp_secret(user).await?;
    Ok(Json(state.auth.provisioning(&user)?))
}

pub async fn show_qr_code(
    State(state): State<ServiceState>,
    AnySession(session): AnySession,
) -> Result<impl IntoResponse, ApiError> {
    enrollment_session(&session)?;
    let user = state.auth.user(session.user_id).await?;
    let user = state.auth.ensure_otp_secret(user).await?;
    let png = state.auth.qr_png(&user)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub status: &'static str,
}

pub async fn logout(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>), ApiError> {
    if let Some(token) = session_token(&headers) {
        if !state.sessions.revoke(&token)? {
            warn!("logout with unknown session");
        }
    }
    Ok((
        without_session_cookie(jar),
        Json(LogoutResponse {
            status: "logged_out",
        }),
    ))
}
