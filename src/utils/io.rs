use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::error;

use crate::protocol::error::{FdfsError, ProtocolError};

/// Read a `len` byte response body into memory, refusing anything over `limit`.
///
/// An oversized body is rejected before any of it is read or allocated.
pub async fn read_body<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: u64,
    limit: u64,
) -> Result<Vec<u8>, FdfsError> {
    if len > limit {
        error!("Response body of {} bytes exceeds limit {}", len, limit);
        return Err(ProtocolError::BodyTooLarge { len, limit }.into());
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Copy exactly `len` bytes from `reader` into `writer`.
/// Ending early is an `UnexpectedEof`, never a silent short copy.
pub async fn copy_exact<R, W>(reader: &mut R, writer: &mut W, len: u64) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = tokio::io::copy(&mut reader.take(len), writer).await?;
    if copied != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("copied {} of {} bytes", copied, len),
        ));
    }
    Ok(())
}
