pub mod aggregate;
pub mod allocate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod input;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;

#[cfg(test)]
mod fixtures;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{compute, run};
