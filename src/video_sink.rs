use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::runtime::{Builder, Handle};
use tokio::sync::watch;
use tracing::{debug, error, info};
use crate::callback::{CallbackSlot, CameraCallback};
use crate::config::{ConnectionInfo, SinkConfig};
use crate::control_message::ControlMessage;
use crate::framer::PacketFramer;
use crate::io_result::IoResult;
use crate::supervisor::ConnectionSupervisor;
use crate::transport::socket_transport::SocketTransport;
use crate::transport::Transport;

/// A pipe between a camera client and the camera VHAL: the client writes encoded video packets to
///  the sink, and the VHAL sends control messages back to the client's registered callback.
///
/// Creating a sink starts its background thread, which connects (and reconnects) to the VHAL and
///  reads control messages. Dropping the sink stops and joins that thread.
///
/// The methods of this type block the calling thread and can be called from any thread, including
///  from inside the registered callback - but not from inside an application's async runtime,
///  which would need to be blocked for that.
pub struct VideoSink {
    transport: Arc<dyn Transport>,
    framer: PacketFramer,
    callbacks: Arc<CallbackSlot>,
    runtime: Handle,
    cancel: watch::Sender<bool>,
    background_thread: Option<JoinHandle<()>>,
}

impl VideoSink {
    pub fn new(config: SinkConfig) -> anyhow::Result<VideoSink> {
        let transport = Arc::new(SocketTransport::new(config.connection.clone()));
        Self::with_transport(config, transport)
    }

    /// Sink for the VHAL of an Android instance running in a container
    pub fn from_unix(socket_path: impl Into<PathBuf>) -> anyhow::Result<VideoSink> {
        Self::new(SinkConfig::new(ConnectionInfo::unix(socket_path)))
    }

    /// Sink for the VHAL of an Android instance running in a VM
    pub fn from_vsock(cid: u32, port: u32) -> anyhow::Result<VideoSink> {
        Self::new(SinkConfig::new(ConnectionInfo::vsock(cid, port)))
    }

    pub fn with_transport(config: SinkConfig, transport: Arc<dyn Transport>) -> anyhow::Result<VideoSink> {
        config.validate()?;

        // callbacks and blocking connects run on the runtime's blocking threads
        let runtime = Builder::new_current_thread()
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        let callbacks = Arc::new(CallbackSlot::default());
        let supervisor = ConnectionSupervisor::new(&config, transport.clone(), callbacks.clone());
        let (cancel, cancel_receiver) = watch::channel(false);

        info!("starting video sink for {}", config.connection);
        let background_thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                runtime.block_on(supervisor.run(cancel_receiver));
                // a connect attempt may still be blocked in the blocking pool
                runtime.shutdown_background();
            })?;

        Ok(VideoSink {
            framer: PacketFramer::new(transport.clone()),
            transport,
            callbacks,
            runtime: handle,
            cancel,
            background_thread: Some(background_thread),
        })
    }

    /// Register the callback for control messages, replacing a previously registered callback.
    ///  The callback is called on one of the sink's background threads, one message at a time.
    pub fn register_callback(&self, callback: impl Fn(ControlMessage) + Send + Sync + 'static) -> bool {
        let callback: CameraCallback = Arc::new(callback);
        self.callbacks.register(callback);
        true
    }

    /// Send an encoded packet, preceded by its length.
    ///
    /// This is equivalent to sending the length (as a native `usize`) and then the packet as two
    ///  raw packets, except that no other packet can get in between.
    pub fn send_data_packet(&self, packet: &[u8]) -> IoResult {
        self.runtime.block_on(self.framer.send_data_packet(packet))
    }

    /// Send a packet without length header, for cases like I420 where the VHAL knows the size of
    ///  each packet in advance
    pub fn send_raw_packet(&self, packet: &[u8]) -> IoResult {
        self.runtime.block_on(self.framer.send_raw_packet(packet))
    }

    pub fn connected(&self) -> bool {
        self.transport.connected()
    }

    pub fn need_connection_reset(&self) -> bool {
        self.transport.need_connection_reset()
    }

    pub fn clear_reset(&self) {
        self.transport.clear_reset()
    }

    /// Stop the background thread and wait for it to finish. Dropping the sink does the same.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(background_thread) = self.background_thread.take() {
            debug!("stopping video sink");
            self.cancel.send_replace(true);
            if background_thread.join().is_err() {
                error!("video sink background thread panicked");
            }
        }
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        self.stop();
    }
}
