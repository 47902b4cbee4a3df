//! Client side of the camera VHAL video sink: a camera producing process streams encoded video
//!  frames to the camera VHAL (Virtual Hardware Abstraction Layer) of an Android instance, and
//!  receives control commands (open / close camera, negotiated codec and resolution) from it.
//!
//! The VHAL is reachable either through a Unix domain socket or through a vsock (for Android
//!  running in a VM). Both carry the same byte stream protocol.
//!
//! ## Architecture
//!
//! * [video_sink::VideoSink] is the object application code holds. It owns exactly one
//!   background thread that drives the connection supervisor and the control channel reader.
//!   Callbacks run on that runtime's blocking threads so they can send through the sink.
//! * [supervisor::ConnectionSupervisor] makes sure there is a connected transport, retrying
//!   forever with a fixed backoff. Connection failures are only visible in the logs and in the
//!   absence of control traffic - devices come and go, and the sink recovers on its own.
//! * [reader::ControlChannelReader] waits for the transport to become readable and reads one
//!   fixed-size control record per readiness event, dispatching it to the registered callback.
//! * [framer::PacketFramer] writes outbound packets, either length-prefixed or raw.
//! * [transport::Transport] abstracts the concrete socket.
//!
//! ## Control channel (VHAL -> client)
//!
//! A sequence of fixed-size records without length prefix. All fields are u32 little endian,
//!  which is the in-memory layout of the C struct the VHAL uses on its (little endian) platforms:
//!
//! ```ascii
//!  0: version (0: decode outside the VHAL, 1: decode inside the VHAL)
//!  4: command (11: open, 12: close, 13: none)
//!  8: codec (0: H264, 1: I420)
//! 12: resolution (0: 480p, 1: 720p, 2: 1080p)
//! 16: reserved (4 x u32)
//! ```
//!
//! ## Data channel (client -> VHAL)
//!
//! Data packets are prefixed with their length, encoded as a `usize` in native byte order - this
//!  mirrors `size_t` on the VHAL side, so both ends must belong to the same platform family:
//!
//! ```ascii
//!  0: payload length (usize, native byte order)
//!  *: payload
//! ```
//!
//! Raw packets are the payload only, for formats where both sides know the size in advance
//!  (e.g. I420 frames of a negotiated resolution).

pub mod callback;
pub mod config;
pub mod control_message;
pub mod framer;
pub mod io_result;
pub mod reader;
pub mod supervisor;
pub mod transport;
pub mod video_sink;

#[cfg(test)]
pub mod test_util;
