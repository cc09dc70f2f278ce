//! Length-prefixed bincode framing over any ordered byte stream.
//!
//! Each frame is a big-endian `u32` byte count followed by one bincode
//! encoded `Packet`.

use crate::error::GameError;
use crate::protocol::Packet;
use bincode::{deserialize, serialize};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 64 * 1024;

fn invalid_data<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Serializes `packet` into a complete frame.
pub fn encode(packet: &Packet) -> io::Result<Vec<u8>> {
    let body = serialize(packet).map_err(invalid_data)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(invalid_data(GameError::PacketTooLarge(body.len())));
    }

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(packet)?;
    writer.write_all(&frame).await?;
    writer.flush().await
}

/// Reads the next packet. `Ok(None)` means the stream closed between frames.
pub async fn read_packet<R>(reader: &mut R) -> io::Result<Option<Packet>>
where
    R: AsyncRead + Unpin,
{
    // Only an EOF before the first header byte is a clean close.
    let mut header = [0u8; 4];
    if reader.read(&mut header[..1]).await? == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut header[1..]).await?;
    let len = u32::from_be_bytes(header) as usize;

    if len > MAX_FRAME_LEN {
        return Err(invalid_data(GameError::PacketTooLarge(len)));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    deserialize(&body).map(Some).map_err(invalid_data)
}
