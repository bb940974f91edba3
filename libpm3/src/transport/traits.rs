// libpm3/src/transport/traits.rs

use crate::Result;

/// Transport trait abstracts the duplex byte channel away from the
/// protocol and session logic.
///
/// Frames may arrive split or coalesced; `receive` returns whatever bytes
/// the channel produced and the session reassembles them.
pub trait Transport {
    /// Write one complete outbound frame.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read the next available chunk, waiting at most `timeout_ms`.
    /// An empty chunk or a `Timeout` error both mean "nothing yet".
    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>>;

    /// Open the channel. Transports that are open from construction keep
    /// the default.
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the channel.
    fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }
}
