pub mod health_handler;
pub mod metrics_handler;
pub mod mock_handler;
pub mod rate_limit;
pub mod store;
