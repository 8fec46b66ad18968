pub mod route;
pub mod session_guard;

pub use route::Route;
pub use session_guard::resolve;
