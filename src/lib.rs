//! Client side of the tracker/storage wire protocol.
//!
//! Every exchange is a 10-byte [`Header`] followed by a body. A [`Task`]
//! writes one request and reads one response on an already connected stream.

pub mod client;
pub mod config;
pub mod file_info;
pub mod protocol;
pub mod task;
pub mod utils;

pub use client::Client;
pub use config::ClientConfig;
pub use file_info::FileInfo;
pub use protocol::{split_file_id, Command, FdfsError, FileId, Header, ProtocolError, ValidationError};
pub use task::{DownloadTarget, Downloaded, PendingTask, StorageInfo, Task, TaskOutput};
