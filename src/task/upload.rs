use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::file_info::FileInfo;
use crate::protocol::constants::{Command, FILE_EXT_NAME_MAX_LEN, PKG_LEN_SIZE};
use crate::protocol::error::{FdfsError, ProtocolError, ValidationError};
use crate::protocol::file_id::FileId;
use crate::protocol::header::{write_header, Header};
use crate::utils::buffer::ByteBuffer;

/// store path index + file size + extension, ahead of the file bytes
pub const UPLOAD_PREFIX_LEN: usize = 1 + PKG_LEN_SIZE + FILE_EXT_NAME_MAX_LEN;

/// Send the upload and release `file` whatever the outcome.
pub(super) async fn send_and_close<S: AsyncWrite + Unpin>(
    stream: &mut S,
    store_path_index: i8,
    file: &mut FileInfo,
) -> Result<(), FdfsError> {
    let sent = send_request(stream, store_path_index, file).await;
    file.close();
    sent
}

async fn send_request<S: AsyncWrite + Unpin>(
    stream: &mut S,
    store_path_index: i8,
    file: &mut FileInfo,
) -> Result<(), FdfsError> {
    let too_large = ValidationError::FileTooLarge(file.file_size());
    let file_size = i64::try_from(file.file_size()).map_err(|_| too_large.clone())?;
    let pkg_len = file_size
        .checked_add(UPLOAD_PREFIX_LEN as i64)
        .ok_or(too_large)?;

    let mut prefix = ByteBuffer::new(UPLOAD_PREFIX_LEN);
    prefix.put_i8(store_path_index);
    prefix.put_i64(file_size);
    prefix.put_fixed(file.ext_name().as_bytes(), FILE_EXT_NAME_MAX_LEN);

    debug!(
        "Uploading {} bytes (ext={:?}) to store path {}",
        file_size,
        file.ext_name(),
        store_path_index
    );

    write_header(stream, &Header::request(Command::UploadFile, pkg_len)).await?;
    stream.write_all(prefix.as_slice()).await?;
    file.write_content(stream).await?;
    stream.flush().await?;
    Ok(())
}

/// The storage node answers with the new file's id as `group/path` text.
pub(super) fn parse_response(body: Vec<u8>) -> Result<FileId, FdfsError> {
    let text = String::from_utf8(body).map_err(|_| ProtocolError::InvalidUtf8)?;
    match FileId::parse(&text) {
        Ok(file_id) => Ok(file_id),
        Err(_) => {
            error!("Upload response is not a file id: {:?}", text);
            Err(ProtocolError::MalformedFileId(text).into())
        }
    }
}
