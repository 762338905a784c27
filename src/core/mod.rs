//! Core types shared by every layer: constants, errors, addresses and the
//! transport seam.

pub mod constants;
mod address;
mod error;
mod traits;

pub use address::BoxAddress;
pub use error::*;
pub use traits::{DataWaker, Transport};
