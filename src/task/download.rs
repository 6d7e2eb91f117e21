use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use crate::protocol::constants::{DEFAULT_MAX_BUFFERED_DOWNLOAD, GROUP_NAME_MAX_LEN, PKG_LEN_SIZE};
use crate::protocol::error::{FdfsError, ValidationError};
use crate::protocol::file_id::FileId;
use crate::utils::buffer::ByteBuffer;
use crate::utils::io::{copy_exact, read_body};

/// Where downloaded bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// Held in memory; a reply longer than `max_len` is refused before reading.
    Buffer { max_len: u64 },
    /// Created or truncated; removed again if the transfer fails.
    File(PathBuf),
}

impl DownloadTarget {
    pub fn buffer() -> Self {
        DownloadTarget::Buffer {
            max_len: DEFAULT_MAX_BUFFERED_DOWNLOAD,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Downloaded {
    Buffer { data: Vec<u8> },
    File { path: PathBuf, size: u64 },
}

impl Downloaded {
    pub fn size(&self) -> u64 {
        match self {
            Downloaded::Buffer { data } => data.len() as u64,
            Downloaded::File { size, .. } => *size,
        }
    }
}

pub(super) fn encode_request(
    file_id: &FileId,
    offset: u64,
    length: u64,
) -> Result<ByteBuffer, FdfsError> {
    let offset_field = i64::try_from(offset).map_err(|_| ValidationError::OutOfRange {
        field: "offset",
        value: offset,
    })?;
    let length_field = i64::try_from(length).map_err(|_| ValidationError::OutOfRange {
        field: "length",
        value: length,
    })?;

    let mut body =
        ByteBuffer::new(2 * PKG_LEN_SIZE + GROUP_NAME_MAX_LEN + file_id.path.len());
    body.put_i64(offset_field);
    body.put_i64(length_field);
    super::put_file_id(&mut body, file_id)?;
    Ok(body)
}

pub(super) async fn recv_body<S: AsyncRead + Unpin>(
    stream: &mut S,
    len: u64,
    target: DownloadTarget,
) -> Result<Downloaded, FdfsError> {
    match target {
        DownloadTarget::Buffer { max_len } => {
            let data = read_body(stream, len, max_len).await?;
            debug!("Downloaded {} bytes into memory", data.len());
            Ok(Downloaded::Buffer { data })
        }
        DownloadTarget::File(path) => match write_to_file(stream, len, &path).await {
            Ok(()) => {
                debug!("Downloaded {} bytes into {:?}", len, path);
                Ok(Downloaded::File { path, size: len })
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    warn!("Could not remove partial download {:?}: {}", path, rm);
                }
                Err(e)
            }
        },
    }
}

async fn write_to_file<S: AsyncRead + Unpin>(
    stream: &mut S,
    len: u64,
    path: &Path,
) -> Result<(), FdfsError> {
    let file_error = |source| FdfsError::File {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(path).await.map_err(file_error)?;
    copy_exact(stream, &mut file, len).await?;
    file.flush().await.map_err(file_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::Command;
    use crate::protocol::error::ProtocolError;
    use crate::protocol::header::Header;
    use crate::task::{Task, TaskOutput};

    fn response(body: &[u8]) -> Vec<u8> {
        let mut out = Header {
            pkg_len: body.len() as i64,
            cmd: Command::Response.code(),
            status: 0,
        }
        .encode()
        .to_vec();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn request_layout() {
        let body = encode_request(&FileId::new("group1", "M00/x.txt"), 5, 100).unwrap();
        let bytes = body.as_slice();
        assert_eq!(&bytes[0..8], &5i64.to_be_bytes());
        assert_eq!(&bytes[8..16], &100i64.to_be_bytes());
        assert_eq!(&bytes[16..22], b"group1");
        assert_eq!(&bytes[32..], b"M00/x.txt");
    }

    #[test]
    fn oversized_offset_is_rejected() {
        let err = encode_request(&FileId::new("g", "p"), u64::MAX, 0).unwrap_err();
        assert!(matches!(
            err,
            FdfsError::Validation(ValidationError::OutOfRange { field: "offset", .. })
        ));
    }

    #[tokio::test]
    async fn download_into_buffer() {
        let mut out = Vec::new();
        let pending = Task::download(FileId::new("group1", "a.txt"), DownloadTarget::buffer())
            .send_request(&mut out)
            .await
            .unwrap();
        assert_eq!(out[8], 14);

        let input = response(b"file contents");
        let mut stream = &input[..];
        let result = pending.recv_response(&mut stream).await.unwrap();
        assert_eq!(
            result,
            TaskOutput::Downloaded(Downloaded::Buffer {
                data: b"file contents".to_vec()
            })
        );
    }

    #[tokio::test]
    async fn download_into_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let mut out = Vec::new();
        let pending = Task::download(
            FileId::new("group1", "a.bin"),
            DownloadTarget::File(path.clone()),
        )
        .send_request(&mut out)
        .await
        .unwrap();

        let input = response(&[9u8; 300]);
        let mut stream = &input[..];
        let result = pending.recv_response(&mut stream).await.unwrap();
        assert_eq!(
            result,
            TaskOutput::Downloaded(Downloaded::File {
                path: path.clone(),
                size: 300
            })
        );
        assert_eq!(std::fs::read(&path).unwrap(), vec![9u8; 300]);
    }

    #[tokio::test]
    async fn buffered_download_over_cap_is_refused() {
        let mut out = Vec::new();
        let pending = Task::download(
            FileId::new("group1", "big.bin"),
            DownloadTarget::Buffer { max_len: 8 },
        )
        .send_request(&mut out)
        .await
        .unwrap();

        // header claims far more than the cap; only a few bytes follow
        let mut input = Header {
            pkg_len: i64::MAX,
            cmd: Command::Response.code(),
            status: 0,
        }
        .encode()
        .to_vec();
        input.extend_from_slice(b"abc");
        let mut stream = &input[..];

        let err = pending.recv_response(&mut stream).await.unwrap_err();
        assert!(matches!(
            err,
            FdfsError::Protocol(ProtocolError::BodyTooLarge { len, limit: 8 })
                if len == i64::MAX as u64
        ));
        assert_eq!(stream, b"abc");
    }

    #[tokio::test]
    async fn buffered_download_at_cap_is_accepted() {
        let body = [4u8; 8];
        let mut stream = &body[..];
        let result = recv_body(&mut stream, 8, DownloadTarget::Buffer { max_len: 8 })
            .await
            .unwrap();
        assert_eq!(result.size(), 8);
    }

    #[tokio::test]
    async fn truncated_download_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");

        let body = [1u8; 20];
        let mut stream = &body[..];

        let err = recv_body(&mut stream, 64, DownloadTarget::File(path.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, FdfsError::Transport(_)));
        assert!(!path.exists());
    }
}
