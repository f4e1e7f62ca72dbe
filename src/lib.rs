// Hikari image optimization library

pub mod config;
pub mod constants;
pub mod edge;
pub mod error;
pub mod image_optimizer;
pub mod logging;
pub mod metrics;
pub mod origin;
pub mod server;
pub mod storage;
