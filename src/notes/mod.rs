//! Notes module for Dayplan

mod note;
mod store;

pub use note::{sanitize_punctuation, Note, CREATION_TIME_FORMAT};
pub(crate) use note::parse_creation_time;
pub use store::NoteStore;

use std::sync::{Arc, Mutex};

pub type SharedNotes = Arc<Mutex<NoteStore>>;

pub fn shared(store: NoteStore) -> SharedNotes {
    Arc::new(Mutex::new(store))
}
