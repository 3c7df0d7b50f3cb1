//! Notes REST API: list, create, retrieve, update and delete notes as JSON.
//!
//! Every note endpoint requires an authenticated caller. Any authenticated
//! caller may read or modify any note; only creation looks at who is asking.

use actix_web::{web, Either, HttpRequest, HttpResponse, Responder};
use notes_types::{ApiRoot, ErrorDetail, NoteResource, NoteWrite};

use crate::auth::ApiUser;
use crate::db::DbError;
use crate::models::{NoteChanges, NoteInput, WriteMode};
use crate::AppState;

/// Request bodies may be JSON or form-encoded
type NoteBody = Either<web::Json<NoteWrite>, web::Form<NoteWrite>>;

fn into_write(body: NoteBody) -> NoteWrite {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorDetail::new("Not found."))
}

fn db_error(context: &str, e: DbError) -> HttpResponse {
    log::error!("[NOTES] {}: {}", context, e);
    HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error"))
}

/// Index of the API's collections
async fn api_root(req: HttpRequest) -> impl Responder {
    match req.url_for_static("api-notes") {
        Ok(url) => HttpResponse::Ok().json(ApiRoot {
            notes: url.to_string(),
        }),
        Err(e) => {
            log::error!("[NOTES] Failed to build notes URL: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Internal server error"))
        }
    }
}

/// List every note, regardless of author
async fn list_notes(_user: ApiUser, data: web::Data<AppState>) -> impl Responder {
    match data.db.list_notes() {
        Ok(notes) => {
            let body: Vec<NoteResource> = notes.into_iter().map(NoteResource::from).collect();
            HttpResponse::Ok().json(body)
        }
        Err(e) => db_error("Failed to list notes", e),
    }
}

/// Create a note owned by the caller. Any author in the payload is ignored.
async fn create_note(user: ApiUser, data: web::Data<AppState>, body: NoteBody) -> impl Responder {
    let input = match NoteInput::from_write(&into_write(body)) {
        Ok(input) => input,
        Err(errors) => return HttpResponse::BadRequest().json(errors),
    };

    match data.db.create_note(user.user.id, &input) {
        Ok(note) => HttpResponse::Created().json(NoteResource::from(note)),
        Err(e) => db_error("Failed to create note", e),
    }
}

async fn retrieve_note(
    _user: ApiUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match data.db.get_note(path.into_inner()) {
        Ok(Some(note)) => HttpResponse::Ok().json(NoteResource::from(note)),
        Ok(None) => not_found(),
        Err(e) => db_error("Failed to get note", e),
    }
}

/// Shared by PUT (full) and PATCH (partial)
fn apply_update(data: &AppState, id: i64, write: &NoteWrite, mode: WriteMode) -> HttpResponse {
    match data.db.get_note(id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(),
        Err(e) => return db_error("Failed to get note", e),
    }

    let changes = match NoteChanges::from_write(write, mode) {
        Ok(changes) => changes,
        Err(errors) => return HttpResponse::BadRequest().json(errors),
    };

    match data.db.update_note(id, &changes) {
        Ok(Some(note)) => HttpResponse::Ok().json(NoteResource::from(note)),
        Ok(None) => not_found(),
        Err(e) => db_error("Failed to update note", e),
    }
}

async fn update_note(
    _user: ApiUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: NoteBody,
) -> impl Responder {
    apply_update(&data, path.into_inner(), &into_write(body), WriteMode::Full)
}

async fn partial_update_note(
    _user: ApiUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: NoteBody,
) -> impl Responder {
    apply_update(&data, path.into_inner(), &into_write(body), WriteMode::Partial)
}

async fn delete_note(
    _user: ApiUser,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match data.db.delete_note(path.into_inner()) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => not_found(),
        Err(e) => db_error("Failed to delete note", e),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let detail = format!("JSON parse error - {}", err);
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorDetail::new(detail)),
        )
        .into()
    }))
    .service(web::resource("/api/").route(web::get().to(api_root)))
    .service(
        web::resource("/api/notes/")
            .name("api-notes")
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    )
    .service(
        web::resource("/api/notes/{id}/")
            .route(web::get().to(retrieve_note))
            .route(web::put().to(update_note))
            .route(web::patch().to(partial_update_note))
            .route(web::delete().to(delete_note)),
    );
}
