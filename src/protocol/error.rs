use std::path::PathBuf;

/// Every failure the client can report.
#[derive(Debug, thiserror::Error)]
pub enum FdfsError {
    /// Stream read/write failure, including short reads.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("cannot access {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl FdfsError {
    /// Service status code, when the failure came from a response header.
    pub fn status(&self) -> Option<i8> {
        match self {
            FdfsError::Protocol(ProtocolError::Status(status)) => Some(*status),
            _ => None,
        }
    }
}

/// The peer answered with something the client cannot accept.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("response status {0} != 0")]
    Status(i8),
    #[error("invalid package length {0}")]
    InvalidLength(i64),
    #[error("response body too large: {len} bytes, limit {limit}")]
    BodyTooLarge { len: u64, limit: u64 },
    #[error("unexpected {len} byte body in {cmd} response")]
    UnexpectedBody { cmd: String, len: usize },
    #[error("response body is {actual} bytes, expected {expected}")]
    BodyLength { expected: usize, actual: usize },
    #[error("invalid port {0} in tracker response")]
    InvalidPort(i64),
    #[error("malformed file id in response: {0:?}")]
    MalformedFileId(String),
    #[error("response does not match the {0} request")]
    UnexpectedResponse(String),
    #[error("response text is not valid utf-8")]
    InvalidUtf8,
}

/// Caller input rejected before any network activity.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file {0:?} size is zero")]
    EmptyFile(PathBuf),
    #[error("upload of {0} bytes is too large")]
    FileTooLarge(u64),
    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: u64 },
    #[error("invalid file id {0:?}")]
    MalformedFileId(String),
    #[error("group name {0:?} longer than 16 bytes")]
    GroupNameTooLong(String),
    #[error("config line {line_no} is not key=value: {line:?}")]
    ConfigLine { line_no: usize, line: String },
    #[error("config value for {key} is invalid: {value:?}")]
    ConfigValue { key: String, value: String },
    #[error("config format: {0}")]
    ConfigFormat(String),
    #[error("no tracker_server configured")]
    NoTrackers,
}
