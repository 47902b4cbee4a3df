use clap::Parser;
use clap_derive::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use anyhow::anyhow;
use tracing::{info, warn, Level};
use vhal_video_sink::config::{ConnectionInfo, SinkConfig};
use vhal_video_sink::control_message::Command;
use vhal_video_sink::video_sink::VideoSink;

/// Streams a file to a camera VHAL in fixed-size chunks while the VHAL has the camera open
#[derive(Parser)]
struct Args {
    /// the file to stream, e.g. a raw H264 elementary stream
    file: PathBuf,

    #[clap(long)]
    unix: Option<PathBuf>,

    #[clap(long)]
    vsock_cid: Option<u32>,

    #[clap(long)]
    vsock_port: Option<u32>,

    #[clap(long, default_value_t = 64*1024)]
    chunk_size: usize,

    #[clap(long, default_value_t = 33)]
    frame_interval_millis: u64,

    /// send chunks without length header
    #[clap(long, default_value_t = false)]
    raw: bool,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn connection(&self) -> anyhow::Result<ConnectionInfo> {
        if self.chunk_size == 0 {
            return Err(anyhow!("--chunk-size must be positive"));
        }

        match (&self.unix, self.vsock_cid, self.vsock_port) {
            (Some(path), None, None) => Ok(ConnectionInfo::unix(path)),
            (None, Some(cid), Some(port)) => Ok(ConnectionInfo::vsock(cid, port)),
            _ => Err(anyhow!("either --unix or both --vsock-cid and --vsock-port are required")),
        }
    }
}

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::TRACE } else { Level::INFO })
        .try_init()
        .ok();

    let connection = args.connection()?;

    let mut content = Vec::new();
    std::fs::File::open(&args.file)?.read_to_end(&mut content)?;
    if content.is_empty() {
        return Err(anyhow!("{} is empty", args.file.display()));
    }

    let camera_open = Arc::new(AtomicBool::new(false));
    let sink = VideoSink::new(SinkConfig::new(connection))?;

    let open = camera_open.clone();
    sink.register_callback(move |msg| {
        info!(?msg, "control message from camera VHAL");
        match msg.command {
            Command::Open => open.store(true, Ordering::Release),
            Command::Close => open.store(false, Ordering::Release),
            Command::None => {}
        }
    });

    let mut chunks = content.chunks(args.chunk_size).cycle();
    loop {
        if !camera_open.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(100));
            continue;
        }

        let Some(chunk) = chunks.next() else {
            break;
        };
        let result = if args.raw {
            sink.send_raw_packet(chunk)
        }
        else {
            sink.send_data_packet(chunk)
        };
        if result.is_failure() {
            warn!("{}", result.message);
        }

        std::thread::sleep(Duration::from_millis(args.frame_interval_millis));
    }

    Ok(())
}
