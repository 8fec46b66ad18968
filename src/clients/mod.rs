pub mod api_client;
pub mod api_error;

pub use api_client::{Ack, ApiClient, Payload, RequestOptions};
pub use api_error::{ApiError, ApiResult};
