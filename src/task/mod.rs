//! One request/response exchange per task.
//!
//! A [`Task`] is consumed by [`Task::send_request`], which hands back a
//! [`PendingTask`]; that in turn is consumed by [`PendingTask::recv_response`].
//! Neither can be used for a second exchange.

pub mod download;
pub mod tracker;
pub mod upload;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::file_info::FileInfo;
use crate::protocol::constants::{
    Command, FILE_ID_MAX_LEN, GROUP_NAME_MAX_LEN, QUERY_FETCH_BODY_LEN, QUERY_STORE_BODY_LEN,
};
use crate::protocol::error::{FdfsError, ProtocolError, ValidationError};
use crate::protocol::file_id::FileId;
use crate::protocol::header::{read_header, write_header, Header};
use crate::utils::buffer::ByteBuffer;
use crate::utils::io::{copy_exact, read_body};

pub use download::{DownloadTarget, Downloaded};
pub use tracker::StorageInfo;

#[derive(Debug)]
pub enum Task {
    /// Ask a tracker where to store a new file.
    QueryStore,
    /// Ask a tracker which storage node serves `file_id`.
    QueryFetch { file_id: FileId },
    Upload { store_path_index: i8, file: FileInfo },
    Delete { file_id: FileId },
    /// `length` 0 reads to the end of the file.
    Download {
        file_id: FileId,
        offset: u64,
        length: u64,
        target: DownloadTarget,
    },
    ActiveTest,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TaskOutput {
    Storage(StorageInfo),
    Uploaded(FileId),
    Deleted,
    Downloaded(Downloaded),
    Alive,
}

/// What the response parser needs once the request is on the wire.
#[derive(Debug)]
enum Expect {
    QueryStore,
    QueryFetch,
    Upload,
    Delete,
    Download(DownloadTarget),
    ActiveTest,
}

/// A task whose request has been written and whose response is still unread.
#[derive(Debug)]
pub struct PendingTask {
    cmd: Command,
    expect: Expect,
}

impl Task {
    pub fn upload(storage: &StorageInfo, file: FileInfo) -> Self {
        Task::Upload {
            store_path_index: storage.store_path_index,
            file,
        }
    }

    pub fn download(file_id: FileId, target: DownloadTarget) -> Self {
        Task::Download {
            file_id,
            offset: 0,
            length: 0,
            target,
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Task::QueryStore => Command::QueryStoreWithoutGroupOne,
            Task::QueryFetch { .. } => Command::QueryFetchOne,
            Task::Upload { .. } => Command::UploadFile,
            Task::Delete { .. } => Command::DeleteFile,
            Task::Download { .. } => Command::DownloadFile,
            Task::ActiveTest => Command::ActiveTest,
        }
    }

    /// Write header and body. An owned upload source is closed on every path.
    pub async fn send_request<S: AsyncWrite + Unpin>(
        self,
        stream: &mut S,
    ) -> Result<PendingTask, FdfsError> {
        let cmd = self.command();
        debug!("Sending {} request", cmd);

        let expect = match self {
            Task::QueryStore => {
                send_body(stream, cmd, &ByteBuffer::default()).await?;
                Expect::QueryStore
            }
            Task::QueryFetch { file_id } => {
                let mut body = ByteBuffer::new(GROUP_NAME_MAX_LEN + file_id.path.len());
                put_file_id(&mut body, &file_id)?;
                send_body(stream, cmd, &body).await?;
                Expect::QueryFetch
            }
            Task::Upload {
                store_path_index,
                mut file,
            } => {
                upload::send_and_close(stream, store_path_index, &mut file).await?;
                Expect::Upload
            }
            Task::Delete { file_id } => {
                let mut body = ByteBuffer::new(GROUP_NAME_MAX_LEN + file_id.path.len());
                put_file_id(&mut body, &file_id)?;
                send_body(stream, cmd, &body).await?;
                Expect::Delete
            }
            Task::Download {
                file_id,
                offset,
                length,
                target,
            } => {
                let body = download::encode_request(&file_id, offset, length)?;
                send_body(stream, cmd, &body).await?;
                Expect::Download(target)
            }
            Task::ActiveTest => {
                send_body(stream, cmd, &ByteBuffer::default()).await?;
                Expect::ActiveTest
            }
        };

        debug!("{} request sent", cmd);
        Ok(PendingTask { cmd, expect })
    }

    /// Send the request and read the matching response on the same stream.
    pub async fn execute<S: AsyncRead + AsyncWrite + Unpin>(
        self,
        stream: &mut S,
    ) -> Result<TaskOutput, FdfsError> {
        self.send_request(stream).await?.recv_response(stream).await
    }
}

impl PendingTask {
    pub fn command(&self) -> Command {
        self.cmd
    }

    pub async fn recv_response<S: AsyncRead + Unpin>(
        self,
        stream: &mut S,
    ) -> Result<TaskOutput, FdfsError> {
        let cmd = self.cmd;
        let result = self.read_output(stream).await;
        match &result {
            Ok(_) => debug!("{} response received", cmd),
            Err(e) => error!("{} exchange failed: {}", cmd, e),
        }
        result
    }

    async fn read_output<S: AsyncRead + Unpin>(
        self,
        stream: &mut S,
    ) -> Result<TaskOutput, FdfsError> {
        let header = read_header(stream).await?;
        // read_header rejects negative lengths
        let len = header.pkg_len as u64;

        match self.expect {
            Expect::QueryStore => {
                let body = read_fixed_body(stream, len, QUERY_STORE_BODY_LEN).await?;
                Ok(TaskOutput::Storage(tracker::parse_store_response(&body)?))
            }
            Expect::QueryFetch => {
                let body = read_fixed_body(stream, len, QUERY_FETCH_BODY_LEN).await?;
                Ok(TaskOutput::Storage(tracker::parse_fetch_response(&body)?))
            }
            Expect::Upload => {
                let body = read_body(stream, len, FILE_ID_MAX_LEN as u64).await?;
                Ok(TaskOutput::Uploaded(upload::parse_response(body)?))
            }
            Expect::Delete => {
                expect_empty_body(stream, self.cmd, len).await?;
                Ok(TaskOutput::Deleted)
            }
            Expect::Download(target) => Ok(TaskOutput::Downloaded(
                download::recv_body(stream, len, target).await?,
            )),
            Expect::ActiveTest => {
                expect_empty_body(stream, self.cmd, len).await?;
                Ok(TaskOutput::Alive)
            }
        }
    }
}

async fn send_body<S: AsyncWrite + Unpin>(
    stream: &mut S,
    cmd: Command,
    body: &ByteBuffer,
) -> Result<(), FdfsError> {
    write_header(stream, &Header::request(cmd, body.len() as i64)).await?;
    if !body.is_empty() {
        stream.write_all(body.as_slice()).await?;
    }
    stream.flush().await?;
    Ok(())
}

/// `group` padded to 16 bytes, then the remote path.
fn put_file_id(body: &mut ByteBuffer, file_id: &FileId) -> Result<(), FdfsError> {
    if file_id.group.len() > GROUP_NAME_MAX_LEN {
        return Err(ValidationError::GroupNameTooLong(file_id.group.clone()).into());
    }
    body.put_fixed(file_id.group.as_bytes(), GROUP_NAME_MAX_LEN);
    body.extend(file_id.path.as_bytes());
    Ok(())
}

/// Consume and discard `len` bytes so the stream stays framed.
async fn drain<S: AsyncRead + Unpin>(stream: &mut S, len: u64) -> Result<(), FdfsError> {
    copy_exact(stream, &mut tokio::io::sink(), len).await?;
    Ok(())
}

async fn expect_empty_body<S: AsyncRead + Unpin>(
    stream: &mut S,
    cmd: Command,
    len: u64,
) -> Result<(), FdfsError> {
    if len == 0 {
        return Ok(());
    }
    drain(stream, len).await?;
    Err(ProtocolError::UnexpectedBody {
        cmd: cmd.to_string(),
        len: len as usize,
    }
    .into())
}

async fn read_fixed_body<S: AsyncRead + Unpin>(
    stream: &mut S,
    len: u64,
    expected: usize,
) -> Result<Vec<u8>, FdfsError> {
    if len != expected as u64 {
        drain(stream, len).await?;
        return Err(ProtocolError::BodyLength {
            expected,
            actual: len as usize,
        }
        .into());
    }
    let mut body = vec![0u8; expected];
    stream.read_exact(&mut body).await?;
    Ok(body)
}
