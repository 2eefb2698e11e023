pub mod chunk;
pub mod error;
pub mod extract;
pub mod http;
pub mod insight;
pub mod merge;
pub mod novelty;
pub mod pipeline;
pub mod provider;
pub mod similarity;
pub mod store;
pub mod types;

pub use error::*;
pub use types::*;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
