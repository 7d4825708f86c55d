pub mod error;
pub mod extract;
pub mod routes;
pub mod server;

pub use error::{ServerError, ServerResult};
pub use routes::{create_router, AppState};
pub use server::Server;
