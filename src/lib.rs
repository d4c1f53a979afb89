pub mod api;
pub mod budget;
pub mod core;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod policy;
pub mod scheduler;
pub mod utils;
