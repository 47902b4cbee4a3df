use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use anyhow::anyhow;
use async_trait::async_trait;
use socket2::{Domain, SockAddr, Socket, Type};
use tokio::io::unix::AsyncFd;
use tracing::{debug, trace};
use crate::config::ConnectionInfo;
use crate::io_result::IoResult;
use crate::transport::{ConnectionId, Transport};

/// A stream socket connection to the camera VHAL, either a Unix domain socket or a vsock
///  depending on the [ConnectionInfo]. The socket is non-blocking and registered with the tokio
///  reactor of the runtime that connected it.
pub struct SocketTransport {
    connection: ConnectionInfo,
    socket: RwLock<Option<CurrentSocket>>,
    next_connection_id: AtomicU64,
    need_reset: AtomicBool,
}

#[derive(Clone)]
struct CurrentSocket {
    id: ConnectionId,
    fd: Arc<AsyncFd<Socket>>,
}

impl SocketTransport {
    pub fn new(connection: ConnectionInfo) -> SocketTransport {
        SocketTransport {
            connection,
            socket: RwLock::new(None),
            next_connection_id: AtomicU64::new(1),
            need_reset: AtomicBool::new(false),
        }
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    fn current_socket(&self) -> Option<CurrentSocket> {
        self.socket.read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace_socket(&self, socket: Option<CurrentSocket>) {
        *self.socket.write()
            .unwrap_or_else(|e| e.into_inner()) = socket;
    }
}

fn connect_blocking(connection: &ConnectionInfo) -> std::io::Result<Socket> {
    let (domain, addr) = match connection {
        ConnectionInfo::Unix { socket_path } => (Domain::UNIX, SockAddr::unix(socket_path)?),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        ConnectionInfo::Vsock { cid, port } => (Domain::VSOCK, SockAddr::vsock(*cid, *port)),
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        ConnectionInfo::Vsock { .. } => return Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "vsock is not supported on this platform")),
    };

    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.connect(&addr)?;
    Ok(socket)
}

#[async_trait]
impl Transport for SocketTransport {
    async fn connect(&self) -> anyhow::Result<()> {
        let connection = self.connection.clone();
        let socket = tokio::task::spawn_blocking(move || connect_blocking(&connection))
            .await?
            .map_err(|e| anyhow!("connecting to {}: {}", self.connection, e))?;

        socket.set_nonblocking(true)?;
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        self.replace_socket(Some(CurrentSocket {
            id,
            fd: Arc::new(AsyncFd::new(socket)?),
        }));
        debug!("connected to {} (connection #{})", self.connection, id);
        Ok(())
    }

    fn connected(&self) -> bool {
        self.current_socket().is_some()
    }

    fn connection_id(&self) -> Option<ConnectionId> {
        self.current_socket().map(|s| s.id)
    }

    async fn readable(&self) -> anyhow::Result<()> {
        let socket = self.current_socket()
            .ok_or_else(|| anyhow!("not connected to {}", self.connection))?;

        // the guard retains readiness when dropped, so the following recv() sees it
        let _guard = socket.fd.readable().await?;
        Ok(())
    }

    async fn send(&self, connection: ConnectionId, buf: &[u8]) -> IoResult {
        let socket = match self.current_socket() {
            Some(current) if current.id == connection => current.fd,
            Some(_) => return IoResult::failed(format!("connection #{} to {} was replaced", connection, self.connection)),
            None => return IoResult::failed(format!("not connected to {}", self.connection)),
        };

        let mut written = 0;
        while written < buf.len() {
            let mut guard = match socket.writable().await {
                Ok(guard) => guard,
                Err(e) => return e.into(),
            };

            match guard.try_io(|inner| {
                let mut s: &Socket = inner.get_ref();
                s.write(&buf[written..])
            }) {
                Ok(Ok(0)) => return IoResult::failed("connection closed by peer"),
                Ok(Ok(n)) => written += n,
                Ok(Err(e)) => return e.into(),
                Err(_would_block) => continue,
            }
        }

        // the bytes went to a connection that was reset in the meantime
        if self.connection_id() != Some(connection) {
            return IoResult::failed(format!("connection #{} to {} was reset during the write", connection, self.connection));
        }

        trace!("sent {} bytes", written);
        IoResult::ok(written)
    }

    async fn recv(&self, buf: &mut [u8]) -> IoResult {
        let Some(CurrentSocket { fd: socket, .. }) = self.current_socket() else {
            return IoResult::failed(format!("not connected to {}", self.connection));
        };

        let mut read = 0;
        while read < buf.len() {
            let mut guard = match socket.readable().await {
                Ok(guard) => guard,
                Err(e) => return e.into(),
            };

            match guard.try_io(|inner| {
                let mut s: &Socket = inner.get_ref();
                s.read(&mut buf[read..])
            }) {
                Ok(Ok(0)) => {
                    debug!("peer closed the connection after {} of {} bytes", read, buf.len());
                    break;
                }
                Ok(Ok(n)) => read += n,
                Ok(Err(e)) => return e.into(),
                Err(_would_block) => continue,
            }
        }

        trace!("received {} bytes", read);
        IoResult::ok(read)
    }

    fn reset(&self) {
        debug!("resetting connection to {}", self.connection);
        self.replace_socket(None);
        self.need_reset.store(true, Ordering::Release);
    }

    fn need_connection_reset(&self) -> bool {
        self.need_reset.load(Ordering::Acquire)
    }

    fn clear_reset(&self) {
        self.need_reset.store(false, Ordering::Release);
    }
}
