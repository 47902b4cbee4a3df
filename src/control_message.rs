use bytes::{Buf, BufMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Where the video stream is decoded
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum VhalVersion {
    /// the client decodes, the VHAL receives decoded frames
    V1 = 0,
    /// the VHAL decodes the encoded stream itself
    V2 = 1,
}

/// Camera operation requested by the VHAL
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum Command {
    Open = 11,
    Close = 12,
    None = 13,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum VideoCodec {
    H264 = 0,
    I420 = 1,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum FrameResolution {
    R480p = 0,
    R720p = 1,
    R1080p = 2,
}

impl Default for VhalVersion {
    fn default() -> Self {
        VhalVersion::V2
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::None
    }
}

impl Default for VideoCodec {
    fn default() -> Self {
        VideoCodec::H264
    }
}

impl Default for FrameResolution {
    fn default() -> Self {
        FrameResolution::R480p
    }
}

/// Camera capabilities that the client is asked to provide
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct VideoParams {
    pub codec: VideoCodec,
    pub resolution: FrameResolution,
    pub reserved: [u32; 4],
}

/// A control message sent by the camera VHAL to the client.
///
/// On the wire, this is a fixed-size record without any framing: the VHAL writes the in-memory
///  representation of its C struct. We treat that layout as an explicit format (see
///  [ControlMessage::ser]) rather than relying on our own memory layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ControlMessage {
    pub version: VhalVersion,
    pub command: Command,
    pub video_params: VideoParams,
}

impl ControlMessage {
    pub const SERIALIZED_LEN: usize = 8 * size_of::<u32>();

    pub fn ser(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(self.version.into());
        buf.put_u32_le(self.command.into());
        buf.put_u32_le(self.video_params.codec.into());
        buf.put_u32_le(self.video_params.resolution.into());
        for r in self.video_params.reserved {
            buf.put_u32_le(r);
        }
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<ControlMessage> {
        let version = VhalVersion::try_from_primitive(buf.try_get_u32_le()?)?;
        let command = Command::try_from_primitive(buf.try_get_u32_le()?)?;
        let codec = VideoCodec::try_from_primitive(buf.try_get_u32_le()?)?;
        let resolution = FrameResolution::try_from_primitive(buf.try_get_u32_le()?)?;

        let mut reserved = [0u32; 4];
        for r in reserved.iter_mut() {
            *r = buf.try_get_u32_le()?;
        }

        Ok(ControlMessage {
            version,
            command,
            video_params: VideoParams {
                codec,
                resolution,
                reserved,
            },
        })
    }
}
