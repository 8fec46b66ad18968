pub mod connection;
pub mod debounce;
pub mod error;
pub mod machine;
pub mod presence;
pub mod session;
pub mod stomp;

pub use error::RealtimeError;
pub use machine::{SyncAction, SyncInput, SyncMachine, SyncStatus, OFFLINE_NOTICE};
pub use presence::Presence;
pub use session::{open, SyncHandle, SyncOptions, SyncSnapshot};
