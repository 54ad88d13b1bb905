mod mesh_handle;
mod observer;
mod orchestrator;

pub use mesh_handle::*;
pub use observer::*;
pub use orchestrator::*;
