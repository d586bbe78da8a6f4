pub mod api;
pub mod app;
pub mod credentials;
pub mod errors;
pub mod http;
pub mod mock;
pub mod queries;
pub mod query;
pub mod retry;
pub mod transport;
