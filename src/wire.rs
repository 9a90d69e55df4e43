//! Wire format for the pose service.
//!
//! Frames are length-prefixed JSON:
//!
//! ```text
//! ┌──────────────────┬─────────────────────┐
//! │ Length (4 bytes) │ JSON payload        │
//! │ Big-endian u32   │ (variable size)     │
//! └──────────────────┴─────────────────────┘
//! ```
//!
//! Frames above 1 MiB are rejected and close the connection.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Maximum accepted frame payload
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Pose report sent by an agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoseRequest {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Acknowledgement returned for every pose report
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoseAck {
    pub ok: bool,
}

/// Write one length-prefixed JSON frame.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<()> {
    let payload = serde_json::to_vec(msg)?;
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed JSON frame.
///
/// Returns `Ok(None)` when the read times out so callers can poll their
/// shutdown flag between frames.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::Protocol(format!("frame too large: {} bytes", len)));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    Ok(Some(serde_json::from_slice(&payload)?))
}
