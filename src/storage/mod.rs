pub mod local_storage;
pub mod session_store;
pub mod theme;

pub use local_storage::{LocalStorage, StorageError};
pub use session_store::SessionStore;
pub use theme::{Theme, ThemeStore};
