use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use crate::callback::CallbackSlot;
use crate::config::SinkConfig;
use crate::reader::{cancelled, ControlChannelReader, ReaderExit};
use crate::transport::Transport;

/// Keeps the connection to the camera VHAL alive: connect (retrying forever with a fixed
///  backoff), read control messages until the connection breaks, and start over.
///
/// Connection problems are never reported to application code directly - they show up in the
///  logs, and in control messages not arriving.
pub struct ConnectionSupervisor {
    transport: Arc<dyn Transport>,
    reader: ControlChannelReader,
    reconnect_backoff: Duration,
    connection: String,
}

impl ConnectionSupervisor {
    pub fn new(config: &SinkConfig, transport: Arc<dyn Transport>, callbacks: Arc<CallbackSlot>) -> ConnectionSupervisor {
        ConnectionSupervisor {
            reader: ControlChannelReader::new(transport.clone(), callbacks, config.poll_timeout),
            transport,
            reconnect_backoff: config.reconnect_backoff,
            connection: config.connection.to_string(),
        }
    }

    #[instrument(name = "vhal_supervisor", skip_all, fields(connection = %self.connection))]
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!("starting");

        while !*cancel.borrow() {
            if !self.transport.connected() {
                let connect_result = select! {
                    _ = cancelled(&mut cancel) => break,
                    r = self.transport.connect() => r,
                };

                if let Err(e) = connect_result {
                    warn!("failed to connect to camera VHAL: {:#}. Retrying after {:?}", e, self.reconnect_backoff);
                    select! {
                        _ = cancelled(&mut cancel) => break,
                        _ = sleep(self.reconnect_backoff) => {}
                    }
                    continue;
                }

                info!("connected to camera VHAL");
            }

            match self.reader.run(&mut cancel).await {
                ReaderExit::Cancelled => break,
                ReaderExit::Disconnected(e) => warn!("lost connection to camera VHAL: {:#}", e),
            }
        }

        info!("stopped");
    }
}
