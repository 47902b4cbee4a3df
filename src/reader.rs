use std::sync::Arc;
use std::time::Duration;
use anyhow::{anyhow, bail};
use tokio::select;
use tokio::sync::watch;
use tokio::task::spawn_blocking;
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use crate::callback::CallbackSlot;
use crate::control_message::ControlMessage;
use crate::transport::Transport;

/// Why [ControlChannelReader::run] returned
#[derive(Debug)]
pub enum ReaderExit {
    Cancelled,
    /// The connection is gone or unusable. The transport was reset, and the supervisor should
    ///  reconnect.
    Disconnected(anyhow::Error),
}

/// Reads control messages from a connected transport and dispatches them to the registered
///  callback, one fixed-size message per readiness event.
///
/// The callback runs on the runtime's blocking threads rather than on the thread driving the
///  runtime, so that it can send packets through the sink (which needs the runtime's IO driver)
///  and so that application sends are not stalled while a callback is busy. The reader still waits
///  for the callback to return before it reads the next message.
pub struct ControlChannelReader {
    transport: Arc<dyn Transport>,
    callbacks: Arc<CallbackSlot>,
    poll_timeout: Duration,
}

impl ControlChannelReader {
    pub fn new(transport: Arc<dyn Transport>, callbacks: Arc<CallbackSlot>, poll_timeout: Duration) -> ControlChannelReader {
        ControlChannelReader {
            transport,
            callbacks,
            poll_timeout,
        }
    }

    /// Read until the connection breaks or `cancel` is set. Cancellation interrupts a pending
    ///  wait for data immediately.
    pub async fn run(&self, cancel: &mut watch::Receiver<bool>) -> ReaderExit {
        loop {
            select! {
                _ = cancelled(cancel) => return ReaderExit::Cancelled,
                result = self.read_next() => {
                    if let Err(e) = result {
                        return ReaderExit::Disconnected(e);
                    }
                }
            }
        }
    }

    /// Wait for readability (with timeout), then read and dispatch a single control message.
    ///
    /// A timeout is not an error. Everything that leaves the connection in an unknown state resets
    ///  the transport before returning an error.
    pub(crate) async fn read_next(&self) -> anyhow::Result<()> {
        match timeout(self.poll_timeout, self.transport.readable()).await {
            Err(_) => {
                trace!("no control message within {:?}", self.poll_timeout);
                return Ok(());
            }
            Ok(Err(e)) => {
                self.transport.reset();
                return Err(e.context("waiting for control messages failed"));
            }
            Ok(Ok(())) => {}
        }

        debug!("camera VHAL has a message for us");

        let mut buf = [0u8; ControlMessage::SERIALIZED_LEN];
        let result = match timeout(self.poll_timeout, self.transport.recv(&mut buf)).await {
            Ok(result) => result,
            Err(_) => {
                self.transport.reset();
                bail!("incomplete control message: the rest did not arrive within {:?}", self.poll_timeout);
            }
        };
        if result.is_failure() {
            self.transport.reset();
            return Err(anyhow!("failed to read control message: {}", result.message));
        }
        if result.transferred != ControlMessage::SERIALIZED_LEN as isize {
            self.transport.reset();
            bail!("incomplete control message: {} of {} bytes", result.transferred, ControlMessage::SERIALIZED_LEN);
        }

        match ControlMessage::deser(&mut buf.as_ref()) {
            Ok(msg) => {
                debug!(?msg, "received control message");
                let callbacks = self.callbacks.clone();
                if let Err(e) = spawn_blocking(move || callbacks.dispatch(msg)).await {
                    warn!("camera callback did not complete: {}", e);
                }
            }
            Err(e) => {
                // the record has a fixed size, so the stream is still in sync
                warn!("skipping control message that can not be decoded ({:?}): {}", buf, e);
            }
        }
        Ok(())
    }
}

/// Completes when `cancel` is set, or when its sender is gone
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|&is_cancelled| is_cancelled).await;
}
