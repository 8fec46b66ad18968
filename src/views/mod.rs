pub mod dashboard;
pub mod editor;
pub mod login;
pub mod register;

pub use dashboard::DashboardView;
pub use editor::EditorView;
pub use login::LoginView;
pub use register::RegisterView;
