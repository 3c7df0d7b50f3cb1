//! Login and logout for the web UI (session cookie) and the API (bearer token).

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use notes_types::{ErrorDetail, LoginRequest, TokenResponse};
use serde::Deserialize;

use crate::auth::{
    cookie_token, current_web_user, redirect, removal_cookie, safe_next, session_cookie, ApiUser,
};
use crate::config::LOGIN_URL;
use crate::html;
use crate::models::{Session, User};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Please enter a correct username and password.";

#[derive(Debug, Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

/// Check credentials and open a session
fn login(data: &AppState, username: &str, password: &str) -> Result<Option<(User, Session)>, HttpResponse> {
    let user = match data.db.verify_user_credentials(username, password) {
        Ok(Some(user)) => user,
        Ok(None) => {
            log::warn!("[AUTH] Failed login for {:?}", username);
            return Ok(None);
        }
        Err(e) => {
            log::error!("[AUTH] Credential check failed: {}", e);
            return Err(HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error")));
        }
    };

    match data.db.create_session(user.id, data.config.session_ttl()) {
        Ok(session) => {
            log::info!("[AUTH] User {} logged in", user.username);
            Ok(Some((user, session)))
        }
        Err(e) => {
            log::error!("[AUTH] Failed to create session: {}", e);
            Err(HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error")))
        }
    }
}

fn login_page(next: &str, username: &str, error: Option<&str>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::login(next, username, error))
}

async fn login_form(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<LoginQuery>,
) -> impl Responder {
    let next = safe_next(query.next.as_deref());
    if current_web_user(&data, &req).is_some() {
        return redirect(next);
    }
    login_page(next, "", None)
}

async fn login_submit(data: web::Data<AppState>, form: web::Form<LoginForm>) -> impl Responder {
    let next = safe_next(form.next.as_deref());

    match login(&data, &form.username, &form.password) {
        Ok(Some((_, session))) => HttpResponse::Found()
            .insert_header((actix_web::http::header::LOCATION, next))
            .cookie(session_cookie(&data.config, &session.token))
            .finish(),
        Ok(None) => login_page(next, &form.username, Some(INVALID_CREDENTIALS)),
        Err(resp) => resp,
    }
}

/// End the browser session and return to the login page
async fn logout(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(token) = cookie_token(&req) {
        if let Err(e) = data.db.delete_session(&token) {
            log::error!("[AUTH] Failed to delete session: {}", e);
        }
    }

    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, LOGIN_URL))
        .cookie(removal_cookie(&data.config))
        .finish()
}

/// Exchange credentials for a bearer token
async fn api_login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    match login(&data, &body.username, &body.password) {
        Ok(Some((_, session))) => HttpResponse::Ok().json(TokenResponse {
            token: session.token,
            expires_at: session.expires_at,
        }),
        Ok(None) => HttpResponse::BadRequest().json(ErrorDetail::new(
            "Unable to log in with provided credentials.",
        )),
        Err(resp) => resp,
    }
}

/// Revoke the token (or cookie session) used for this request
async fn api_logout(ctx: ApiUser, data: web::Data<AppState>) -> impl Responder {
    match data.db.delete_session(&ctx.session.token) {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(e) => {
            log::error!("[AUTH] Failed to delete session: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error"))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/accounts/login/")
            .route(web::get().to(login_form))
            .route(web::post().to(login_submit)),
    )
    .service(web::resource("/accounts/logout/").route(web::post().to(logout)))
    .service(web::resource("/api/auth/login/").route(web::post().to(api_login)))
    .service(web::resource("/api/auth/logout/").route(web::post().to(api_logout)));
}
