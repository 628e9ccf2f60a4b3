// HTTP server setup (Axum)
pub mod app;
pub mod completion;
pub mod middleware;
pub mod routes;

pub use app::*;
