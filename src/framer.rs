use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use crate::io_result::IoResult;
use crate::transport::{ConnectionId, Transport};

/// Writes outbound packets to the VHAL. It is shared by all application threads that send, and it
///  serializes them so that a packet's bytes are never interleaved with those of another packet.
///
/// Each packet is bound to the connection that is current when the packet starts: if the
///  background thread replaces the connection between the header and the payload, the payload
///  write fails instead of going out on the new connection.
///
/// No retry happens here: a failed write resets the transport, and the failure is returned to the
///  caller.
pub struct PacketFramer {
    transport: Arc<dyn Transport>,
    write_lock: Mutex<()>,
}

impl PacketFramer {
    pub const SIZE_HEADER_LEN: usize = size_of::<usize>();

    pub fn new(transport: Arc<dyn Transport>) -> PacketFramer {
        PacketFramer {
            transport,
            write_lock: Mutex::new(()),
        }
    }

    /// Send the packet's length (as a native `usize`) followed by the packet. These are two
    ///  separate writes: if the second one fails, the VHAL has received a length without its
    ///  payload, and only the connection reset that follows restores a clean packet boundary.
    pub async fn send_data_packet(&self, packet: &[u8]) -> IoResult {
        let _guard = self.write_lock.lock().await;
        trace!("sending data packet of {} bytes", packet.len());

        let connection = self.transport.connection_id();
        let result = self.write(connection, &packet.len().to_ne_bytes()).await;
        if result.is_failure() {
            return self.fail(connection, result, "Error in writing payload size to Camera VHal: ");
        }

        self.send_payload(connection, packet).await
    }

    /// Send the packet without any header, for formats where the VHAL knows the packet size
    ///  in advance
    pub async fn send_raw_packet(&self, packet: &[u8]) -> IoResult {
        let _guard = self.write_lock.lock().await;
        trace!("sending raw packet of {} bytes", packet.len());

        let connection = self.transport.connection_id();
        self.send_payload(connection, packet).await
    }

    async fn send_payload(&self, connection: Option<ConnectionId>, packet: &[u8]) -> IoResult {
        let result = self.write(connection, packet).await;
        if result.is_failure() {
            return self.fail(connection, result, "Error in writing payload to Camera VHal: ");
        }
        result
    }

    async fn write(&self, connection: Option<ConnectionId>, buf: &[u8]) -> IoResult {
        match connection {
            Some(connection) => self.transport.send(connection, buf).await,
            None => IoResult::failed("not connected"),
        }
    }

    fn fail(&self, connection: Option<ConnectionId>, result: IoResult, context: &str) -> IoResult {
        warn!("{}{}", context, result.message);
        if self.transport.connection_id() == connection {
            self.transport.reset();
        }
        else {
            // the connection this packet was bound to is already gone, and its replacement is clean
            debug!("connection was replaced during the write - not resetting its replacement");
        }
        result.with_context(context)
    }
}
