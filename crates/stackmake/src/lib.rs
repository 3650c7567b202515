pub mod config;
pub mod emit;
pub mod error;
pub mod model;
pub mod plan;
pub mod stacks;
pub mod util;

pub use error::{Error, Result};
