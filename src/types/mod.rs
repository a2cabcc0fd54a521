//! Type definitions for powerpoll

mod error;
mod response;
mod snapshot;

pub use error::*;
pub use response::*;
pub use snapshot::*;
