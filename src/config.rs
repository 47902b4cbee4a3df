use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::bail;

/// vsock CIDs that can not address an Android VM: the hypervisor, local loopback and the wildcard
const RESERVED_VSOCK_CIDS: [u32; 3] = [0, 1, u32::MAX];

/// Identifies the camera VHAL endpoint. This is chosen once when a sink is created, and it
///  determines the kind of socket that is used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectionInfo {
    /// The VHAL listens on a Unix domain socket (Android in a container)
    Unix {
        socket_path: PathBuf,
    },
    /// The VHAL listens on a vsock (Android in a VM)
    Vsock {
        cid: u32,
        port: u32,
    },
}

impl ConnectionInfo {
    pub fn unix(socket_path: impl Into<PathBuf>) -> ConnectionInfo {
        ConnectionInfo::Unix { socket_path: socket_path.into() }
    }

    /// The camera VHAL of Android instance `n` listens on `<socket_dir>/camera-socket<n>`
    pub fn unix_for_instance(socket_dir: impl AsRef<Path>, android_instance_id: u32) -> ConnectionInfo {
        ConnectionInfo::Unix {
            socket_path: socket_dir.as_ref().join(format!("camera-socket{}", android_instance_id)),
        }
    }

    pub fn vsock(cid: u32, port: u32) -> ConnectionInfo {
        ConnectionInfo::Vsock { cid, port }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            ConnectionInfo::Unix { socket_path } => {
                if socket_path.as_os_str().is_empty() {
                    bail!("unix socket path must not be empty");
                }
            }
            ConnectionInfo::Vsock { cid, .. } => {
                if RESERVED_VSOCK_CIDS.contains(cid) {
                    bail!("vsock cid {} is reserved and can not address an Android VM", cid);
                }
            }
        }
        Ok(())
    }
}

impl Display for ConnectionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionInfo::Unix { socket_path } => write!(f, "unix:{}", socket_path.display()),
            ConnectionInfo::Vsock { cid, port } => write!(f, "vsock:{}:{}", cid, port),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub connection: ConnectionInfo,

    /// The fixed delay between two failed connection attempts. There is no upper bound on the
    ///  number of attempts and no exponential increase: the VHAL may come up at any time, and the
    ///  sink should pick it up quickly when it does.
    pub reconnect_backoff: Duration,

    /// Upper bound for a single wait for control messages. Shutdown does not depend on this
    ///  timeout since the wait is interrupted by cancellation.
    pub poll_timeout: Duration,

    /// Name of the sink's background thread
    pub thread_name: String,
}

impl SinkConfig {
    pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_millis(33);
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn new(connection: ConnectionInfo) -> SinkConfig {
        SinkConfig {
            connection,
            reconnect_backoff: Self::DEFAULT_RECONNECT_BACKOFF,
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
            thread_name: "vhal-video-sink".to_string(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.connection.validate()?;
        if self.poll_timeout.is_zero() {
            bail!("poll timeout must be greater than zero");
        }
        Ok(())
    }
}
