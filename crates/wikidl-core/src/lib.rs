pub mod config;
pub mod logging;

pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod pool;
pub mod task;
