mod note;
mod session;
mod user;

pub use note::{
    is_valid_url, Note, NoteChanges, NoteFields, NoteInput, WriteMode, TITLE_MAX_LEN, URL_MAX_LEN,
};
pub use session::Session;
pub use user::{validate_username, User, USERNAME_MAX_LEN};
