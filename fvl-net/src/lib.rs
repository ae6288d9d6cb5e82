// fvl-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::HttpFetcher;
pub use validation::validate_url;
