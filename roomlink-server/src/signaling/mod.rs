mod connection_table;
mod relay_router;
mod signaling_output;
mod signaling_service;
mod ws_connection;

pub use connection_table::*;
pub use relay_router::*;
pub use signaling_output::*;
pub use signaling_service::*;
pub use ws_connection::*;
