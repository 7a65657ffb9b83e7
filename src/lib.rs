//! On-chain Guestbook Service Library

pub mod chain;
pub mod config;
pub mod guestbook;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use guestbook::{GuestbookState, Session};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
