pub mod socket_transport;

use async_trait::async_trait;
#[cfg(test)] use mockall::automock;
use crate::io_result::IoResult;

/// Identifies one established connection. Every successful [Transport::connect] yields a new id.
pub type ConnectionId = u64;

/// This is the connection to the camera VHAL as seen by the sink. It decouples connection
///  lifecycle and protocol handling from the concrete kind of socket, and it facilitates mocking
///  the I/O part away for testing.
///
/// All operations take `&self`: the background thread reads and resets while application threads
///  send. Implementations must be safe for that, but they need not serialize writes - the
///  [crate::framer::PacketFramer] does that.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish a connection. This may take as long as the underlying connect operation takes.
    async fn connect(&self) -> anyhow::Result<()>;

    fn connected(&self) -> bool;

    /// The currently established connection, if any
    fn connection_id(&self) -> Option<ConnectionId>;

    /// Wait until there is data to read (or the peer closed the connection, which must be reported
    ///  as readable so the subsequent [Transport::recv] can observe it). Returns an error if the
    ///  wait itself failed or if there is no connection.
    async fn readable(&self) -> anyhow::Result<()>;

    /// Write the entire buffer to `connection`, returning the number of bytes written. This fails
    ///  if `connection` is not (or is no longer) the current connection, so a sequence of writes
    ///  for the same id never spans two connections.
    async fn send(&self, connection: ConnectionId, buf: &[u8]) -> IoResult;

    /// Read until the buffer is full or the peer closed the connection. A short count is not an
    ///  error at this level.
    async fn recv(&self, buf: &mut [u8]) -> IoResult;

    /// Tear the connection down and mark it as needing a reset
    fn reset(&self);

    fn need_connection_reset(&self) -> bool;

    fn clear_reset(&self);
}
