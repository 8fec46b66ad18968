pub mod confirm;
pub mod toast;

pub use confirm::{ConfirmAction, ConfirmDialog, ConfirmRequest};
pub use toast::{Toast, ToastKind, ToastQueue};
