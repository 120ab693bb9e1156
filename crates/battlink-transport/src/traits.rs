use std::time::Duration;

use crate::error::Result;

/// A bidirectional byte-chunk channel to one peripheral.
///
/// Models a BLE UART-like pair: `send` writes one complete outbound frame,
/// `recv` waits up to `window` for the next notification chunk. Chunks carry
/// no alignment guarantee — a frame may arrive split across several chunks,
/// or one chunk may carry several frames plus noise. Reassembly and
/// resynchronization belong to the frame layer, not the transport.
pub trait Transport {
    /// Write one encoded frame to the peripheral.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Wait up to `window` for the next inbound chunk.
    ///
    /// Returns `Ok(None)` when the window elapses with no bytes available.
    /// That is not an error — the request/response loop treats it as "ask
    /// again".
    fn recv(&mut self, window: Duration) -> Result<Option<Vec<u8>>>;
}
