pub mod handle;
pub mod http_error;
pub mod is_global;
pub mod tracing;
pub mod x509;
