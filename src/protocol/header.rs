use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, trace, warn};

use crate::protocol::constants::{Command, HEADER_SIZE};
use crate::protocol::error::{FdfsError, ProtocolError};

/// Fixed-size envelope in front of every request and response (10 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub pkg_len: i64,
    pub cmd: i8,
    pub status: i8,
}

impl Header {
    pub const SIZE: usize = HEADER_SIZE;

    /// Request header: status is always 0 on the way out.
    pub fn request(cmd: Command, pkg_len: i64) -> Self {
        Self {
            pkg_len,
            cmd: cmd.code(),
            status: 0,
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.pkg_len.to_be_bytes());
        buf[8] = self.cmd as u8;
        buf[9] = self.status as u8;
        buf
    }

    pub fn decode(buf: &[u8; Self::SIZE]) -> Self {
        let mut len = [0u8; 8];
        len.copy_from_slice(&buf[0..8]);
        Self {
            pkg_len: i64::from_be_bytes(len),
            cmd: buf[8] as i8,
            status: buf[9] as i8,
        }
    }
}

pub async fn write_header<W: AsyncWrite + Unpin>(
    stream: &mut W,
    header: &Header,
) -> Result<(), FdfsError> {
    trace!(
        "Writing header: pkg_len={}, cmd={}, status={}",
        header.pkg_len,
        header.cmd,
        header.status
    );
    stream.write_all(&header.encode()).await?;
    Ok(())
}

/// Read one response header. A non-zero status fails the exchange.
pub async fn read_header<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Header, FdfsError> {
    let mut buf = [0u8; Header::SIZE];
    stream.read_exact(&mut buf).await?;

    let header = Header::decode(&buf);
    trace!(
        "Read header: pkg_len={}, cmd={}, status={}",
        header.pkg_len,
        header.cmd,
        header.status
    );

    if header.status != 0 {
        error!("Response status {} != 0", header.status);
        return Err(ProtocolError::Status(header.status).into());
    }
    if header.pkg_len < 0 {
        error!("Negative package length: {}", header.pkg_len);
        return Err(ProtocolError::InvalidLength(header.pkg_len).into());
    }
    if header.cmd != Command::Response.code() {
        warn!("Unexpected response command byte {}", header.cmd);
    }

    Ok(header)
}
