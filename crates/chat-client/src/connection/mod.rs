//! Connection management

mod manager;
mod state;
mod transport;
mod websocket;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use manager::ConnectionManager;
pub use state::ConnectionState;
pub use transport::{Connector, TransportError, TransportEvent, TransportHandle};
pub use websocket::WsConnector;
