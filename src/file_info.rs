//! Upload sources: a file on disk or a buffer in memory.
//!
//! A `FileInfo` knows its exact size and extension up front so the upload
//! header can be written before any content is streamed.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::protocol::constants::FILE_EXT_NAME_MAX_LEN;
use crate::protocol::error::{FdfsError, ValidationError};
use crate::utils::io::copy_exact;

#[derive(Debug)]
enum Content {
    File { file: File, path: PathBuf },
    Buffer(Vec<u8>),
    Released,
}

#[derive(Debug)]
pub struct FileInfo {
    file_size: u64,
    content: Content,
    ext_name: String,
}

impl FileInfo {
    /// Open `path` for upload. Empty files are rejected before the handle is kept.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FdfsError> {
        let path = path.as_ref();
        let file_error = |source| FdfsError::File {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).await.map_err(file_error)?;
        let metadata = file.metadata().await.map_err(file_error)?;
        if metadata.len() == 0 {
            return Err(ValidationError::EmptyFile(path.to_path_buf()).into());
        }
        if i64::try_from(metadata.len()).is_err() {
            return Err(ValidationError::FileTooLarge(metadata.len()).into());
        }

        let ext_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| truncate_ext(ext))
            .unwrap_or_default();

        debug!(
            "Opened {:?} for upload: size={}, ext={:?}",
            path,
            metadata.len(),
            ext_name
        );

        Ok(Self {
            file_size: metadata.len(),
            content: Content::File {
                file,
                path: path.to_path_buf(),
            },
            ext_name,
        })
    }

    pub fn from_buffer(buffer: impl Into<Vec<u8>>, ext_name: &str) -> Self {
        let buffer = buffer.into();
        Self {
            file_size: buffer.len() as u64,
            content: Content::Buffer(buffer),
            ext_name: truncate_ext(ext_name),
        }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn ext_name(&self) -> &str {
        &self.ext_name
    }

    pub fn owns_handle(&self) -> bool {
        matches!(self.content, Content::File { .. })
    }

    /// Release the file handle if one is held. Safe to call any number of times.
    pub fn close(&mut self) {
        if !self.owns_handle() {
            return;
        }
        if let Content::File { file, path } =
            std::mem::replace(&mut self.content, Content::Released)
        {
            drop(file);
            trace!("Closed upload source {:?}", path);
        }
    }

    #[cfg(all(test, unix))]
    pub(crate) fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;
        match &self.content {
            Content::File { file, .. } => Some(file.as_raw_fd()),
            _ => None,
        }
    }

    /// Stream exactly `file_size` bytes of content into `writer`.
    pub async fn write_content<W: AsyncWrite + Unpin>(
        &mut self,
        writer: &mut W,
    ) -> Result<(), FdfsError> {
        match &mut self.content {
            Content::File { file, .. } => copy_exact(file, writer, self.file_size).await?,
            Content::Buffer(buffer) => writer.write_all(buffer).await?,
            Content::Released => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "upload source already closed",
                )
                .into())
            }
        }
        Ok(())
    }
}

/// Cut an extension to at most six bytes without splitting a character.
fn truncate_ext(ext: &str) -> String {
    let mut end = 0;
    for (idx, ch) in ext.char_indices() {
        if idx + ch.len_utf8() > FILE_EXT_NAME_MAX_LEN {
            break;
        }
        end = idx + ch.len_utf8();
    }
    ext[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        (dir, path)
    }

    #[test]
    fn buffer_extension_is_truncated() {
        let info = FileInfo::from_buffer(vec![1, 2, 3], "longextension");
        assert_eq!(info.ext_name(), "longex");
        assert_eq!(info.file_size(), 3);
        assert!(!info.owns_handle());
    }

    #[tokio::test]
    async fn closing_a_buffer_is_a_noop() {
        let mut info = FileInfo::from_buffer(b"abc".to_vec(), "txt");
        info.close();
        let mut out = Vec::new();
        info.write_content(&mut out).await.unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_ext("jpg"), "jpg");
        assert_eq!(truncate_ext("abcdef"), "abcdef");
        assert_eq!(truncate_ext("ééééé"), "ééé");
    }

    #[tokio::test]
    async fn path_size_and_extension() {
        let (_dir, path) = temp_file("photo.jpeg", b"0123456789abc");
        let info = FileInfo::from_path(&path).await.unwrap();
        assert_eq!(info.file_size(), 13);
        assert_eq!(info.ext_name(), "jpeg");
        assert!(info.owns_handle());
    }

    #[tokio::test]
    async fn path_extension_is_truncated() {
        let (_dir, path) = temp_file("archive.tarball", b"x");
        let info = FileInfo::from_path(&path).await.unwrap();
        assert_eq!(info.ext_name(), "tarbal");
    }

    #[tokio::test]
    async fn path_without_dot_has_empty_extension() {
        let (_dir, path) = temp_file("README", b"x");
        let info = FileInfo::from_path(&path).await.unwrap();
        assert_eq!(info.ext_name(), "");
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let (_dir, path) = temp_file("empty.txt", b"");
        let err = FileInfo::from_path(&path).await.unwrap_err();
        assert!(matches!(err, FdfsError::Validation(ValidationError::EmptyFile(_))));
    }

    #[tokio::test]
    async fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileInfo::from_path(dir.path().join("nope.bin"))
            .await
            .unwrap_err();
        match err {
            FdfsError::File { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_dir, path) = temp_file("a.bin", b"abc");
        let mut info = FileInfo::from_path(&path).await.unwrap();
        #[cfg(target_os = "linux")]
        let fd = info.raw_fd().unwrap();
        info.close();
        assert!(!info.owns_handle());
        #[cfg(target_os = "linux")]
        assert_ne!(
            std::fs::read_link(format!("/proc/self/fd/{}", fd)).ok(),
            Some(path.clone())
        );
        info.close();

        let mut out = Vec::new();
        assert!(info.write_content(&mut out).await.is_err());
    }

    #[tokio::test]
    async fn file_content_is_streamed() {
        let (_dir, path) = temp_file("a.txt", b"hello world");
        let mut info = FileInfo::from_path(&path).await.unwrap();
        let mut out = Vec::new();
        info.write_content(&mut out).await.unwrap();
        assert_eq!(out, b"hello world");
    }
}
