mod server;

pub use server::{ServerConfig, ServerConfigBuilder};
