pub mod config;
pub mod gateway;

pub use config::HttpGatewayConfig;
pub use gateway::{GatewayBuildError, HttpGateway};
