pub mod transport;

pub use transport::{DeliveryMode, Transport, TransportEvent};
