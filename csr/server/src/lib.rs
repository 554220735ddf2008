pub mod authority;
pub mod configuration;
pub mod server;
