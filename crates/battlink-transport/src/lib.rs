//! Byte-chunk transport seam for battlink.
//!
//! The protocol engine never talks to a socket or a BLE characteristic
//! directly. It talks to a [`Transport`]: something that can push one
//! outbound frame and hand back whatever bytes arrived within a polling
//! window. A BLE notify/write characteristic pair, a Unix socket, or an
//! in-memory emulator all fit behind the same trait.

pub mod error;
pub mod traits;
#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use traits::Transport;
#[cfg(unix)]
pub use uds::{SocketListener, SocketTransport};
