//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID stamping/propagation)
//!     → handlers.rs (session, message list, mutations)
//!     → JSON response
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use handlers::AppState;
pub use server::HttpServer;
