//! Account registration, login, logout, and session introspection.
//!
//! Login failures are deliberately uniform: unknown email and wrong
//! password both return the same 401, so the endpoint cannot be used to
//! probe which addresses have accounts.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};
use souk_api::dto::{LoginRequest, RegisterRequest, UserDto};
use souk_api::{convert, ApiError, ApiErrorCode};
use souk_model::{parse_name, EmailAddress, PhoneNumber, Role, User, UserId};
use souk_store::users;
use souk_store::StoreError;
use tracing::error;

use crate::auth::{
    authenticate, clear_session_cookie_header, hash_password, mint_session_token,
    session_cookie_header, verify_password, SessionClaims,
};
use crate::http::{
    created_response, error_response, json_body, ok_response, respond,
};
use crate::middleware::RequestId;
use crate::{run_store, store_fail, AppState};

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 128;

fn invalid_credentials() -> ApiError {
    ApiError::new(
        ApiErrorCode::AuthInvalid,
        "invalid credentials",
        json!({}),
        "req-unknown",
    )
}

fn with_session_cookie(mut response: Response, cookie: &str) -> Response {
    // Minted cookies are ASCII by construction; a rejected header value
    // would mean a bug upstream, not a client problem.
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Field-level checks for registration, collected so the client sees all
/// problems at once.
fn parse_registration(request: &RegisterRequest) -> Result<(String, EmailAddress), ApiError> {
    let mut field_errors: Vec<Value> = Vec::new();
    let mut fail = |field: &str, reason: String| {
        field_errors.push(json!({ "field": field, "reason": reason }));
    };

    let name = match parse_name("name", &request.name) {
        Ok(name) => Some(name),
        Err(err) => {
            fail("name", err.to_string());
            None
        }
    };
    let email = match EmailAddress::parse(&request.email) {
        Ok(email) => Some(email),
        Err(err) => {
            fail("email", err.to_string());
            None
        }
    };
    if request.password.len() < PASSWORD_MIN_LEN {
        fail(
            "password",
            format!("must be at least {PASSWORD_MIN_LEN} characters"),
        );
    } else if request.password.len() > PASSWORD_MAX_LEN {
        fail(
            "password",
            format!("must be at most {PASSWORD_MAX_LEN} characters"),
        );
    }
    if let Some(phone) = request.phone.as_deref().filter(|p| !p.is_empty()) {
        if let Err(err) = PhoneNumber::parse(phone) {
            fail("phone", err.to_string());
        }
    }

    if !field_errors.is_empty() {
        return Err(ApiError::validation_failed(Value::Array(field_errors)));
    }
    match (name, email) {
        (Some(name), Some(email)) => Ok((name, email)),
        _ => Err(ApiError::internal()),
    }
}

fn session_for(state: &AppState, user: &User) -> Result<String, ApiError> {
    let claims = SessionClaims::issue(
        user.id,
        user.role,
        user.vendor_id,
        Utc::now(),
        state.config.session_ttl,
    );
    let token = mint_session_token(&claims, &state.config.session_secret).map_err(|err| {
        error!("session token mint failed: {err}");
        ApiError::internal()
    })?;
    Ok(session_cookie_header(
        &token,
        state.config.session_ttl,
        state.config.cookie_secure,
    ))
}

async fn register(
    state: &AppState,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(UserDto, String), ApiError> {
    let request = json_body(payload)?;
    let (name, email) = parse_registration(&request)?;
    let password = request.password;
    let now = Utc::now();
    let id = UserId::generate();

    // Argon2 is CPU-heavy, so the hash happens on the blocking pool along
    // with the insert.
    let user = run_store(state, move |conn| {
        let password_hash = hash_password(&password).map_err(|err| {
            error!("password hash failed: {err}");
            ApiError::internal()
        })?;
        let user = User::new(id, name, email, password_hash, Role::User, now);
        users::insert_user(conn, &user).map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::conflict("email already registered"),
            other => store_fail(other),
        })?;
        Ok(user)
    })
    .await?;

    let cookie = session_for(state, &user)?;
    Ok((convert::user_dto(&user), cookie))
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    match register(&state, payload).await {
        Ok((dto, cookie)) => {
            with_session_cookie(created_response("account created", dto), &cookie)
        }
        Err(err) => error_response(err, &request_id),
    }
}

async fn login(
    state: &AppState,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(UserDto, String), ApiError> {
    let request = json_body(payload)?;
    let email = EmailAddress::parse(&request.email).map_err(|_| invalid_credentials())?;
    let password = request.password;

    let user = run_store(state, move |conn| {
        let user = users::user_by_email(conn, &email)
            .map_err(store_fail)?
            .ok_or_else(invalid_credentials)?;
        if !verify_password(&password, &user.password_hash) {
            return Err(invalid_credentials());
        }
        Ok(user)
    })
    .await?;

    let cookie = session_for(state, &user)?;
    Ok((convert::user_dto(&user), cookie))
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    match login(&state, payload).await {
        Ok((dto, cookie)) => with_session_cookie(ok_response("logged in", dto), &cookie),
        Err(err) => error_response(err, &request_id),
    }
}

pub(crate) async fn logout_handler(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie_header(state.config.cookie_secure);
    with_session_cookie(ok_response("logged out", Value::Null), &cookie)
}

async fn me(state: &AppState, headers: &HeaderMap) -> Result<UserDto, ApiError> {
    let claims = authenticate(headers, &state.config.session_secret, Utc::now())?;
    let uid = claims.uid;
    // A valid token for a since-deleted account reads as an invalid
    // session, not a 404.
    let user = run_store(state, move |conn| {
        users::user_by_id(conn, &uid)
            .map_err(store_fail)?
            .ok_or_else(ApiError::auth_invalid)
    })
    .await?;
    Ok(convert::user_dto(&user))
}

pub(crate) async fn me_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    respond(me(&state, &headers).await, &request_id, "session")
}
