pub mod error;
pub mod model;

pub use error::{ErrorKind, SignalingError};
pub use model::*;
