//! Plain types shared by the volley engine and its front-ends.
mod config;
mod constants;
mod counter;
mod error;
mod stats;

pub use config::*;
pub use constants::*;
pub use counter::*;
pub use error::*;
pub use stats::*;
