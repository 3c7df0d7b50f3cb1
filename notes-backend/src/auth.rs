//! Request authentication shared by the web and API controllers.
//!
//! The API accepts `Authorization: Bearer <token>` or the session cookie;
//! the web UI only looks at the cookie.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use notes_types::ErrorDetail;
use std::future::{ready, Ready};
use std::ops::Deref;

use crate::config::{Config, HOME_URL, LOGIN_URL, SESSION_COOKIE};
use crate::db::DbError;
use crate::models::{Session, User};
use crate::AppState;

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub session: Session,
}

/// Authenticated API caller. Rejects with 401 before any body is read.
#[derive(Debug, Clone)]
pub struct ApiUser(pub AuthContext);

/// Logged-in browser session. Rejects with a login redirect before any body is read.
#[derive(Debug, Clone)]
pub struct WebUser(pub AuthContext);

impl Deref for ApiUser {
    type Target = AuthContext;

    fn deref(&self) -> &AuthContext {
        &self.0
    }
}

impl Deref for WebUser {
    type Target = AuthContext;

    fn deref(&self) -> &AuthContext {
        &self.0
    }
}

impl FromRequest for ApiUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req, require_api_user).map(ApiUser))
    }
}

impl FromRequest for WebUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req, require_web_user).map(WebUser))
    }
}

fn authenticate(
    req: &HttpRequest,
    check: fn(&web::Data<AppState>, &HttpRequest) -> Result<AuthContext, HttpResponse>,
) -> Result<AuthContext, actix_web::Error> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        log::error!("[AUTH] Application state is not configured");
        return Err(rejection(
            HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error")),
        ));
    };
    check(state, req).map_err(rejection)
}

fn rejection(resp: HttpResponse) -> actix_web::Error {
    InternalError::from_response("request not authenticated", resp).into()
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn cookie_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|s| !s.is_empty())
}

fn resolve(state: &AppState, token: &str) -> Result<Option<AuthContext>, DbError> {
    Ok(state
        .db
        .validate_session(token, state.config.session_ttl())?
        .map(|(session, user)| AuthContext { user, session }))
}

/// Require an authenticated API caller, or produce a 401 response
fn require_api_user(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<AuthContext, HttpResponse> {
    let token = match bearer_token(req).or_else(|| cookie_token(req)) {
        Some(t) => t,
        None => {
            return Err(unauthorized("Authentication credentials were not provided."));
        }
    };

    match resolve(state, &token) {
        Ok(Some(ctx)) => Ok(ctx),
        Ok(None) => Err(unauthorized("Invalid or expired session.")),
        Err(e) => {
            log::error!("[AUTH] Session validation error: {}", e);
            Err(HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error")))
        }
    }
}

/// Require a logged-in browser session, or redirect to the login page
fn require_web_user(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<AuthContext, HttpResponse> {
    let Some(token) = cookie_token(req) else {
        return Err(login_redirect(req));
    };

    match resolve(state, &token) {
        Ok(Some(ctx)) => Ok(ctx),
        Ok(None) => Err(login_redirect(req)),
        Err(e) => {
            log::error!("[AUTH] Session validation error: {}", e);
            Err(HttpResponse::InternalServerError()
                .content_type("text/html; charset=utf-8")
                .body(crate::html::error_page("Server error", "Internal server error")))
        }
    }
}

/// Optional web session (for pages that render either way)
pub fn current_web_user(state: &web::Data<AppState>, req: &HttpRequest) -> Option<AuthContext> {
    let token = cookie_token(req)?;
    match resolve(state, &token) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("[AUTH] Session validation error: {}", e);
            None
        }
    }
}

fn unauthorized(detail: &str) -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
        .json(ErrorDetail::new(detail))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Redirect to the login page, remembering where the user was going
pub fn login_redirect(req: &HttpRequest) -> HttpResponse {
    let next = match req.uri().path_and_query() {
        Some(pq) => pq.as_str().to_string(),
        None => req.path().to_string(),
    };
    redirect(&format!("{}?next={}", LOGIN_URL, urlencoding::encode(&next)))
}

/// Only same-site absolute paths are honored as post-login destinations.
/// Whitespace and control characters disqualify a target.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if is_local_path(n) => n,
        _ => HOME_URL,
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(|c| c.is_whitespace() || c.is_control())
}

pub fn session_cookie(config: &Config, token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(time::Duration::hours(config.session_ttl_hours))
        .finish()
}

pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/notes/3/")), "/notes/3/");
        assert_eq!(safe_next(Some("https://evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("//evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("/\\evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("/\t/evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("/\n/evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("/\r\n/evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("/ /evil.example")), HOME_URL);
        assert_eq!(safe_next(Some("/notes/?q=a%20b")), "/notes/?q=a%20b");
        assert_eq!(safe_next(None), HOME_URL);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc-123"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc-123"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert!(bearer_token(&req).is_none());
    }

    #[test]
    fn test_login_redirect_keeps_path_and_query() {
        let req = TestRequest::get().uri("/notes/5/?x=1").to_http_request();
        let resp = login_redirect(&req);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/accounts/login/?next=%2Fnotes%2F5%2F%3Fx%3D1");
    }
}
