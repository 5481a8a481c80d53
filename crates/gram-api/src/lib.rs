pub mod auth;
pub mod error;
pub mod interactions;
pub mod middleware;
pub mod photos;
pub mod uploads;

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, ApiResult};
