//! Server-rendered pages for the notes web UI.
//!
//! Every value that originates from a user is escaped before it reaches the page.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use notes_types::FieldErrors;
use std::collections::HashMap;

use crate::config::LOGIN_URL;
use crate::models::{Note, User, TITLE_MAX_LEN, URL_MAX_LEN};

/// Values shown in the note form, either blank, from an existing note, or as submitted
#[derive(Debug, Clone, Default)]
pub struct NoteFormValues {
    pub title: String,
    pub content: String,
    pub url: String,
}

impl From<&Note> for NoteFormValues {
    fn from(note: &Note) -> Self {
        Self {
            title: note.fields.title.clone(),
            content: note.fields.content.clone(),
            url: note.fields.url.clone(),
        }
    }
}

/// Which form is being rendered
#[derive(Debug, Clone, Copy)]
pub enum NoteFormKind {
    Create,
    Edit(i64),
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn layout(title: &str, user: Option<&User>, body: &str) -> String {
    let account = match user {
        Some(u) => format!(
            r#"<span>Signed in as <strong>{}</strong></span>
        <form method="post" action="/accounts/logout/" class="inline"><button type="submit">Log out</button></form>"#,
            encode_text(&u.username)
        ),
        None => format!(r#"<a href="{}">Log in</a>"#, LOGIN_URL),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 2rem auto;
            padding: 0 1rem;
        }}
        nav {{ display: flex; gap: 1rem; align-items: center; margin-bottom: 1.5rem; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 0.4rem; border-bottom: 1px solid #ddd; }}
        .errorlist {{ color: #b00020; margin: 0.2rem 0; }}
        .inline {{ display: inline; }}
        pre {{ white-space: pre-wrap; }}
    </style>
</head>
<body>
    <nav>
        <a href="/notes/">Notes</a>
        <a href="/notes/create/">New note</a>
        {account}
    </nav>
    {body}
</body>
</html>"#,
        title = encode_text(title),
        account = account,
        body = body,
    )
}

fn error_list(errors: &FieldErrors, field: &str) -> String {
    let items = errors.get(field);
    if items.is_empty() {
        return String::new();
    }
    let lis: String = items
        .iter()
        .map(|m| format!("<li>{}</li>", encode_text(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, lis)
}

/// Table of every note
pub fn note_list(user: &User, notes: &[Note], authors: &HashMap<i64, String>) -> String {
    let body = if notes.is_empty() {
        "<h1>Notes</h1>\n    <p>No notes yet.</p>".to_string()
    } else {
        let rows: String = notes
            .iter()
            .map(|n| {
                format!(
                    r#"
        <tr>
            <td><a href="/notes/{id}/">{title}</a></td>
            <td>{author}</td>
            <td>{created}</td>
            <td><a href="/notes/{id}/edit/">Edit</a> <a href="/notes/{id}/delete/">Delete</a></td>
        </tr>"#,
                    id = n.id,
                    title = encode_text(&n.fields.title),
                    author = encode_text(author_name(authors, n.fields.author_id)),
                    created = format_ts(&n.fields.created),
                )
            })
            .collect();
        format!(
            r#"<h1>Notes</h1>
    <table>
        <tr><th>Title</th><th>Author</th><th>Created</th><th></th></tr>{}
    </table>"#,
            rows
        )
    };
    layout("Notes", Some(user), &body)
}

fn author_name(authors: &HashMap<i64, String>, id: i64) -> &str {
    authors.get(&id).map(String::as_str).unwrap_or("unknown")
}

/// Read-only view of a single note
pub fn note_detail(user: &User, note: &Note, author: &str) -> String {
    let link = if note.fields.url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p><a href="{href}" rel="noopener noreferrer">{text}</a></p>"#,
            href = encode_double_quoted_attribute(&note.fields.url),
            text = encode_text(&note.fields.url),
        )
    };

    let body = format!(
        r#"<h1>{title}</h1>
    <pre>{content}</pre>
    {link}
    <p>By {author} &middot; created {created} &middot; updated {updated}</p>
    <p><a href="/notes/{id}/edit/">Edit</a> <a href="/notes/{id}/delete/">Delete</a></p>"#,
        title = encode_text(&note.fields.title),
        content = encode_text(&note.fields.content),
        link = link,
        author = encode_text(author),
        created = format_ts(&note.fields.created),
        updated = format_ts(&note.fields.updated),
        id = note.id,
    );
    layout(&note.fields.title, Some(user), &body)
}

/// Create / edit form, optionally with validation errors
pub fn note_form(
    user: &User,
    kind: NoteFormKind,
    values: &NoteFormValues,
    errors: &FieldErrors,
) -> String {
    let (heading, action) = match kind {
        NoteFormKind::Create => ("New note".to_string(), "/notes/create/".to_string()),
        NoteFormKind::Edit(id) => ("Edit note".to_string(), format!("/notes/{}/edit/", id)),
    };

    let body = format!(
        r#"<h1>{heading}</h1>
    <form method="post" action="{action}">
        <p>
            <label for="id_title">Title</label><br>
            <input type="text" id="id_title" name="title" maxlength="{title_max}" value="{title}">
            {title_errors}
        </p>
        <p>
            <label for="id_content">Content</label><br>
            <textarea id="id_content" name="content" rows="10" cols="60">{content}</textarea>
            {content_errors}
        </p>
        <p>
            <label for="id_url">URL</label><br>
            <input type="url" id="id_url" name="url" maxlength="{url_max}" value="{url}">
            {url_errors}
        </p>
        <button type="submit">Save</button>
        <a href="/notes/">Cancel</a>
    </form>"#,
        heading = heading,
        action = action,
        title_max = TITLE_MAX_LEN,
        title = encode_double_quoted_attribute(&values.title),
        title_errors = error_list(errors, "title"),
        content = encode_text(&values.content),
        content_errors = error_list(errors, "content"),
        url_max = URL_MAX_LEN,
        url = encode_double_quoted_attribute(&values.url),
        url_errors = error_list(errors, "url"),
    );
    layout(&heading, Some(user), &body)
}

/// Delete confirmation
pub fn note_confirm_delete(user: &User, note: &Note) -> String {
    let body = format!(
        r#"<h1>Delete note</h1>
    <p>Are you sure you want to delete "{title}"?</p>
    <form method="post" action="/notes/{id}/delete/">
        <button type="submit">Confirm</button>
        <a href="/notes/{id}/">Cancel</a>
    </form>"#,
        title = encode_text(&note.fields.title),
        id = note.id,
    );
    layout("Delete note", Some(user), &body)
}

pub fn login(next: &str, username: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="errorlist">{}</p>"#, encode_text(e)))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Log in</h1>
    {error}
    <form method="post" action="{login_url}">
        <input type="hidden" name="next" value="{next}">
        <p>
            <label for="id_username">Username</label><br>
            <input type="text" id="id_username" name="username" value="{username}" autofocus>
        </p>
        <p>
            <label for="id_password">Password</label><br>
            <input type="password" id="id_password" name="password">
        </p>
        <button type="submit">Log in</button>
    </form>"#,
        error = error,
        login_url = LOGIN_URL,
        next = encode_double_quoted_attribute(next),
        username = encode_double_quoted_attribute(username),
    );
    layout("Log in", None, &body)
}

pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n    <p>{}</p>",
        encode_text(title),
        encode_text(message)
    );
    layout(title, None, &body)
}
