//! Server-rendered note pages: list, detail, create, edit and delete.

use actix_web::{web, HttpResponse, Responder};
use notes_types::{FieldErrors, NoteWrite};
use serde::Deserialize;
use std::collections::HashMap;

use crate::auth::{redirect, WebUser};
use crate::config::HOME_URL;
use crate::db::DbError;
use crate::html::{self, NoteFormKind, NoteFormValues};
use crate::models::{NoteChanges, NoteInput, WriteMode};
use crate::AppState;

/// Submitted note form. Missing inputs count as empty, and an empty title
/// is reported as missing.
#[derive(Debug, Deserialize)]
struct NoteForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
}

impl NoteForm {
    fn to_write(&self) -> NoteWrite {
        NoteWrite {
            title: Some(self.title.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            content: Some(self.content.clone()),
            url: Some(self.url.clone()),
        }
    }

    fn values(&self) -> NoteFormValues {
        NoteFormValues {
            title: self.title.clone(),
            content: self.content.clone(),
            url: self.url.clone(),
        }
    }
}

fn page(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn not_found_page() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(html::error_page("Not found", "The requested note does not exist."))
}

fn server_error_page(context: &str, e: DbError) -> HttpResponse {
    log::error!("[NOTES] {}: {}", context, e);
    HttpResponse::InternalServerError()
        .content_type("text/html; charset=utf-8")
        .body(html::error_page("Server error", "Internal server error"))
}

async fn index() -> impl Responder {
    redirect(HOME_URL)
}

async fn note_list(ctx: WebUser, data: web::Data<AppState>) -> impl Responder {
    let notes = match data.db.list_notes() {
        Ok(notes) => notes,
        Err(e) => return server_error_page("Failed to list notes", e),
    };
    let authors: HashMap<i64, String> = match data.db.list_users() {
        Ok(users) => users.into_iter().map(|u| (u.id, u.username)).collect(),
        Err(e) => return server_error_page("Failed to list users", e),
    };

    page(html::note_list(&ctx.user, &notes, &authors))
}

async fn note_detail(
    ctx: WebUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    let note = match data.db.get_note(path.into_inner()) {
        Ok(Some(note)) => note,
        Ok(None) => return not_found_page(),
        Err(e) => return server_error_page("Failed to get note", e),
    };
    let author = match data.db.get_user(note.fields.author_id) {
        Ok(Some(user)) => user.username,
        Ok(None) => "unknown".to_string(),
        Err(e) => return server_error_page("Failed to get author", e),
    };

    page(html::note_detail(&ctx.user, &note, &author))
}

async fn create_form(ctx: WebUser) -> impl Responder {
    page(html::note_form(
        &ctx.user,
        NoteFormKind::Create,
        &NoteFormValues::default(),
        &FieldErrors::new(),
    ))
}

/// The requester always becomes the author
async fn create_submit(
    ctx: WebUser,
    data: web::Data<AppState>,
    form: web::Form<NoteForm>,
) -> impl Responder {
    let input = match NoteInput::from_write(&form.to_write()) {
        Ok(input) => input,
        Err(errors) => {
            return page(html::note_form(
                &ctx.user,
                NoteFormKind::Create,
                &form.values(),
                &errors,
            ));
        }
    };

    match data.db.create_note(ctx.user.id, &input) {
        Ok(_) => redirect(HOME_URL),
        Err(e) => server_error_page("Failed to create note", e),
    }
}

async fn edit_form(
    ctx: WebUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match data.db.get_note(path.into_inner()) {
        Ok(Some(note)) => page(html::note_form(
            &ctx.user,
            NoteFormKind::Edit(note.id),
            &NoteFormValues::from(&note),
            &FieldErrors::new(),
        )),
        Ok(None) => not_found_page(),
        Err(e) => server_error_page("Failed to get note", e),
    }
}

async fn edit_submit(
    ctx: WebUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<NoteForm>,
) -> impl Responder {
    let id = path.into_inner();

    match data.db.get_note(id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found_page(),
        Err(e) => return server_error_page("Failed to get note", e),
    }

    let changes = match NoteChanges::from_write(&form.to_write(), WriteMode::Full) {
        Ok(changes) => changes,
        Err(errors) => {
            return page(html::note_form(
                &ctx.user,
                NoteFormKind::Edit(id),
                &form.values(),
                &errors,
            ));
        }
    };

    match data.db.update_note(id, &changes) {
        Ok(Some(_)) => redirect(HOME_URL),
        Ok(None) => not_found_page(),
        Err(e) => server_error_page("Failed to update note", e),
    }
}

async fn delete_confirm(
    ctx: WebUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match data.db.get_note(path.into_inner()) {
        Ok(Some(note)) => page(html::note_confirm_delete(&ctx.user, &note)),
        Ok(None) => not_found_page(),
        Err(e) => server_error_page("Failed to get note", e),
    }
}

async fn delete_submit(
    _user: WebUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match data.db.delete_note(path.into_inner()) {
        Ok(true) => redirect(HOME_URL),
        Ok(false) => not_found_page(),
        Err(e) => server_error_page("Failed to delete note", e),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/notes/").route(web::get().to(note_list)))
        // Registered before `/notes/{id}/` so "create" is never read as an id
        .service(
            web::resource("/notes/create/")
                .route(web::get().to(create_form))
                .route(web::post().to(create_submit)),
        )
        .service(web::resource("/notes/{id}/").route(web::get().to(note_detail)))
        .service(
            web::resource("/notes/{id}/edit/")
                .route(web::get().to(edit_form))
                .route(web::post().to(edit_submit)),
        )
        .service(
            web::resource("/notes/{id}/delete/")
                .route(web::get().to(delete_confirm))
                .route(web::post().to(delete_submit)),
        );
}

#[cfg(test)]
mod tests {
    use crate::config::SESSION_COOKIE;
    use crate::models::NoteInput;
    use crate::test_util::{setup, test_app, TestContext};
    use actix_web::cookie::Cookie;
    use actix_web::test::{self, TestRequest};

    fn cookie(ctx: &TestContext) -> Cookie<'static> {
        Cookie::new(SESSION_COOKIE, ctx.token.clone())
    }

    fn location(resp: &actix_web::dev::ServiceResponse) -> String {
        resp.headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn seed(ctx: &TestContext, title: &str, content: &str) -> i64 {
        ctx.state
            .db
            .create_note(ctx.user.id, &NoteInput::new(title, content, "https://initial.com").unwrap())
            .unwrap()
            .id
    }

    #[actix_web::test]
    async fn test_root_redirects_to_notes() {
        let ctx = setup("viewuser");
        let app = test_app!(ctx);

        let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(location(&resp), "/notes/");
    }

    #[actix_web::test]
    async fn test_note_list_view() {
        let ctx = setup("viewuser");
        seed(&ctx, "Initial Title", "Initial Content");
        let app = test_app!(ctx);

        let req = TestRequest::get().uri("/notes/").cookie(cookie(&ctx)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body = test::read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Initial Title"));
        assert!(body.contains("viewuser"));
    }

    #[actix_web::test]
    async fn test_note_detail_view() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Initial Title", "Initial Content");
        let app = test_app!(ctx);

        let req = TestRequest::get()
            .uri(&format!("/notes/{}/", id))
            .cookie(cookie(&ctx))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("Initial Content"));
    }

    #[actix_web::test]
    async fn test_note_create_view() {
        let ctx = setup("viewuser");
        let app = test_app!(ctx);

        let req = TestRequest::get().uri("/notes/create/").cookie(cookie(&ctx)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = TestRequest::post()
            .uri("/notes/create/")
            .cookie(cookie(&ctx))
            .set_form([
                ("title", "New Note"),
                ("content", "New Content"),
                ("url", "https://new.com"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(location(&resp), "/notes/");

        let notes = ctx.state.db.list_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].fields.title, "New Note");
        assert_eq!(notes[0].fields.author_id, ctx.user.id);
    }

    #[actix_web::test]
    async fn test_create_ignores_author_field() {
        let ctx = setup("viewuser");
        let (other, _) = ctx.other_user("other");
        let app = test_app!(ctx);

        let author = other.id.to_string();
        let req = TestRequest::post()
            .uri("/notes/create/")
            .cookie(cookie(&ctx))
            .set_form([("title", "Mine"), ("author", author.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);

        let notes = ctx.state.db.list_notes().unwrap();
        assert_eq!(notes[0].fields.author_id, ctx.user.id);
    }

    #[actix_web::test]
    async fn test_invalid_create_redisplays_form() {
        let ctx = setup("viewuser");
        let app = test_app!(ctx);

        let req = TestRequest::post()
            .uri("/notes/create/")
            .cookie(cookie(&ctx))
            .set_form([("title", ""), ("content", "Kept content"), ("url", "bad url")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body = test::read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("This field is required."));
        assert!(!body.contains("This field may not be blank."));
        assert!(body.contains("Enter a valid URL."));
        assert!(body.contains("Kept content"));
        assert!(ctx.state.db.list_notes().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_note_update_view() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Initial Title", "Initial Content");
        let created = ctx.state.db.get_note(id).unwrap().unwrap().fields.created;
        let app = test_app!(ctx);

        let req = TestRequest::get()
            .uri(&format!("/notes/{}/edit/", id))
            .cookie(cookie(&ctx))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains(r#"value="Initial Title""#));

        let req = TestRequest::post()
            .uri(&format!("/notes/{}/edit/", id))
            .cookie(cookie(&ctx))
            .set_form([
                ("title", "Updated Title"),
                ("content", "Updated Content"),
                ("url", "https://updated.com"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(location(&resp), "/notes/");

        let note = ctx.state.db.get_note(id).unwrap().unwrap();
        assert_eq!(note.fields.title, "Updated Title");
        assert_eq!(note.fields.url, "https://updated.com");
        assert_eq!(note.fields.created, created);
    }

    #[actix_web::test]
    async fn test_form_without_title_is_required() {
        let ctx = setup("viewuser");
        let app = test_app!(ctx);

        for form in [vec![("content", "No title at all")], vec![("title", "   "), ("content", "Blank")]] {
            let req = TestRequest::post()
                .uri("/notes/create/")
                .cookie(cookie(&ctx))
                .set_form(form)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200);

            let body = test::read_body(resp).await;
            assert!(String::from_utf8_lossy(&body).contains("This field is required."));
        }
        assert!(ctx.state.db.list_notes().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_edit_refreshes_updated_timestamp() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Initial Title", "Initial Content");
        let before = ctx.state.db.get_note(id).unwrap().unwrap();
        let app = test_app!(ctx);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let req = TestRequest::post()
            .uri(&format!("/notes/{}/edit/", id))
            .cookie(cookie(&ctx))
            .set_form([("title", "Edited"), ("content", "Initial Content"), ("url", "")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);

        let after = ctx.state.db.get_note(id).unwrap().unwrap();
        assert_eq!(after.fields.title, "Edited");
        assert_eq!(after.fields.url, "");
        assert_eq!(after.fields.created, before.fields.created);
        assert_eq!(after.fields.author_id, before.fields.author_id);
        assert!(after.fields.updated > before.fields.updated);
    }

    #[actix_web::test]
    async fn test_anonymous_post_redirects_before_reading_body() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Untouched", "");
        let app = test_app!(ctx);

        let req = TestRequest::post()
            .uri("/notes/create/")
            .set_json(serde_json::json!({ "title": "Sneaky" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(location(&resp), "/accounts/login/?next=%2Fnotes%2Fcreate%2F");

        let req = TestRequest::post().uri(&format!("/notes/{}/edit/", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert!(location(&resp).starts_with("/accounts/login/"));

        let req = TestRequest::post()
            .uri(&format!("/notes/{}/edit/", id))
            .cookie(Cookie::new(SESSION_COOKIE, "stale-token"))
            .insert_header(("Content-Type", "application/x-www-form-urlencoded"))
            .set_payload("title=%ZZ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);

        let notes = ctx.state.db.list_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].fields.title, "Untouched");
    }

    #[actix_web::test]
    async fn test_invalid_update_keeps_note() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Initial Title", "Initial Content");
        let app = test_app!(ctx);

        let req = TestRequest::post()
            .uri(&format!("/notes/{}/edit/", id))
            .cookie(cookie(&ctx))
            .set_form([("title", "Still valid"), ("url", "ftp//broken")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let note = ctx.state.db.get_note(id).unwrap().unwrap();
        assert_eq!(note.fields.title, "Initial Title");
    }

    #[actix_web::test]
    async fn test_note_delete_view() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Delete Me", "");
        let app = test_app!(ctx);

        let req = TestRequest::get()
            .uri(&format!("/notes/{}/delete/", id))
            .cookie(cookie(&ctx))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert!(ctx.state.db.get_note(id).unwrap().is_some());

        let req = TestRequest::post()
            .uri(&format!("/notes/{}/delete/", id))
            .cookie(cookie(&ctx))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert!(ctx.state.db.get_note(id).unwrap().is_none());

        let req = TestRequest::get()
            .uri(&format!("/notes/{}/", id))
            .cookie(cookie(&ctx))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_missing_note_pages_are_404() {
        let ctx = setup("viewuser");
        let app = test_app!(ctx);

        for uri in ["/notes/77/", "/notes/77/edit/", "/notes/77/delete/"] {
            let req = TestRequest::get().uri(uri).cookie(cookie(&ctx)).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 404, "{uri}");
        }
    }

    #[actix_web::test]
    async fn test_anonymous_redirected_to_login() {
        let ctx = setup("viewuser");
        let id = seed(&ctx, "Private", "");
        let app = test_app!(ctx);

        let resp = test::call_service(&app, TestRequest::get().uri("/notes/").to_request()).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(location(&resp), "/accounts/login/?next=%2Fnotes%2F");

        let req = TestRequest::post()
            .uri(&format!("/notes/{}/delete/", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert!(location(&resp).starts_with("/accounts/login/"));
        assert!(ctx.state.db.get_note(id).unwrap().is_some());
    }

    #[actix_web::test]
    async fn test_missing_trailing_slash_is_normalized() {
        let ctx = setup("viewuser");
        let app = test_app!(ctx);

        let req = TestRequest::get().uri("/notes").cookie(cookie(&ctx)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
}
