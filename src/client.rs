//! Single-shot operations over fresh TCP connections.
//!
//! Each call resolves a storage node through the first configured tracker,
//! opens one connection per exchange, runs one task and drops the socket.
//! No pooling, no failover and no retries.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::file_info::FileInfo;
use crate::protocol::constants::Command;
use crate::protocol::error::{FdfsError, ProtocolError};
use crate::protocol::file_id::FileId;
use crate::task::{DownloadTarget, Downloaded, StorageInfo, Task, TaskOutput};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Client {
    config: ClientConfig,
    connect_timeout: Duration,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn connect(&self, addr: &str) -> Result<TcpStream, FdfsError> {
        debug!("Connecting to {}", addr);
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", addr),
                )
            })??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// One connection, one exchange.
    async fn run(&self, addr: &str, task: Task) -> Result<TaskOutput, FdfsError> {
        let cmd = task.command();
        let mut stream = self.connect(addr).await?;
        let result = task.execute(&mut stream).await;
        if let Err(e) = stream.shutdown().await {
            warn!("Shutdown of {} connection to {} failed: {}", cmd, addr, e);
        }
        result
    }

    pub async fn query_store(&self) -> Result<StorageInfo, FdfsError> {
        let tracker = self.config.primary_tracker()?;
        match self.run(tracker, Task::QueryStore).await? {
            TaskOutput::Storage(storage) => Ok(storage),
            _ => Err(unexpected(Command::QueryStoreWithoutGroupOne)),
        }
    }

    pub async fn query_fetch(&self, file_id: &FileId) -> Result<StorageInfo, FdfsError> {
        let tracker = self.config.primary_tracker()?;
        let task = Task::QueryFetch {
            file_id: file_id.clone(),
        };
        let cmd = task.command();
        match self.run(tracker, task).await? {
            TaskOutput::Storage(storage) => Ok(storage),
            _ => Err(unexpected(cmd)),
        }
    }

    pub async fn upload(&self, file: FileInfo) -> Result<FileId, FdfsError> {
        let storage = self.query_store().await?;
        let task = Task::upload(&storage, file);
        let cmd = task.command();
        match self.run(&storage.addr, task).await? {
            TaskOutput::Uploaded(file_id) => {
                info!("Uploaded {} via {}", file_id, storage.addr);
                Ok(file_id)
            }
            _ => Err(unexpected(cmd)),
        }
    }

    pub async fn download(
        &self,
        file_id: &FileId,
        target: DownloadTarget,
    ) -> Result<Downloaded, FdfsError> {
        let storage = self.query_fetch(file_id).await?;
        let task = Task::download(file_id.clone(), target);
        let cmd = task.command();
        match self.run(&storage.addr, task).await? {
            TaskOutput::Downloaded(downloaded) => {
                info!("Downloaded {} ({} bytes)", file_id, downloaded.size());
                Ok(downloaded)
            }
            _ => Err(unexpected(cmd)),
        }
    }

    pub async fn delete(&self, file_id: &FileId) -> Result<(), FdfsError> {
        let storage = self.query_fetch(file_id).await?;
        let task = Task::Delete {
            file_id: file_id.clone(),
        };
        let cmd = task.command();
        match self.run(&storage.addr, task).await? {
            TaskOutput::Deleted => {
                info!("Deleted {}", file_id);
                Ok(())
            }
            _ => Err(unexpected(cmd)),
        }
    }

    /// Ping any tracker or storage node.
    pub async fn active_test(&self, addr: &str) -> Result<(), FdfsError> {
        match self.run(addr, Task::ActiveTest).await? {
            TaskOutput::Alive => Ok(()),
            _ => Err(unexpected(Command::ActiveTest)),
        }
    }
}

fn unexpected(cmd: Command) -> FdfsError {
    ProtocolError::UnexpectedResponse(cmd.to_string()).into()
}
