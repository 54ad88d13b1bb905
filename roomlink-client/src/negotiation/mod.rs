mod candidate_buffer;
mod session;
mod state;

pub use candidate_buffer::*;
pub use session::*;
pub use state::*;
