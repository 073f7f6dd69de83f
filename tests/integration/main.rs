mod common;
mod health_test;
mod mock_api_test;
