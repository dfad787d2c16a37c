mod error;
pub mod handlers;
mod router;
mod server;
mod types;

pub use router::dispatch;
pub use server::serve;
pub use types::{ApiRequest, ApiResponse, Method};
