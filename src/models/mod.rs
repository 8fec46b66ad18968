pub mod doc;
pub mod error;
pub mod messages;
pub mod session;
pub mod user;
pub mod version;

pub use doc::*;
pub use error::*;
pub use messages::*;
pub use session::*;
pub use user::*;
pub use version::*;
