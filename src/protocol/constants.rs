//! Protocol constants for tracker and storage communication

use std::fmt;

/// Command byte carried in every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Command {
    UploadFile = 11,
    DeleteFile = 12,
    DownloadFile = 14,
    /// Used on every response header, whatever the request was.
    Response = 100,
    QueryStoreWithoutGroupOne = 101,
    QueryFetchOne = 102,
    ActiveTest = 111,
}

impl Command {
    pub fn code(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for Command {
    type Error = i8;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            11 => Ok(Command::UploadFile),
            12 => Ok(Command::DeleteFile),
            14 => Ok(Command::DownloadFile),
            100 => Ok(Command::Response),
            101 => Ok(Command::QueryStoreWithoutGroupOne),
            102 => Ok(Command::QueryFetchOne),
            111 => Ok(Command::ActiveTest),
            other => Err(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::UploadFile => "upload",
            Command::DeleteFile => "delete",
            Command::DownloadFile => "download",
            Command::Response => "response",
            Command::QueryStoreWithoutGroupOne => "query-store",
            Command::QueryFetchOne => "query-fetch",
            Command::ActiveTest => "active-test",
        };
        write!(f, "{}({})", name, self.code())
    }
}

/// Header size on the wire
pub const HEADER_SIZE: usize = 10;

/// Width of the package length and other 64-bit fields
pub const PKG_LEN_SIZE: usize = 8;

/// Group names are NUL-padded to this width
pub const GROUP_NAME_MAX_LEN: usize = 16;

/// File extension field width in upload requests
pub const FILE_EXT_NAME_MAX_LEN: usize = 6;

/// IP address field width in tracker responses (16 minus the C terminator)
pub const IP_ADDRESS_SIZE: usize = 15;

/// Longest remote file name a storage node hands out
pub const REMOTE_FILENAME_MAX_LEN: usize = 128;

/// Upper bound for an upload reply: `group/remote_filename`
pub const FILE_ID_MAX_LEN: usize = GROUP_NAME_MAX_LEN + 1 + REMOTE_FILENAME_MAX_LEN;

/// Default cap for downloads held in memory
pub const DEFAULT_MAX_BUFFERED_DOWNLOAD: u64 = 256 * 1024 * 1024; // 256MB

/// Tracker reply to a store query: group + ip + port + store path index
pub const QUERY_STORE_BODY_LEN: usize = GROUP_NAME_MAX_LEN + IP_ADDRESS_SIZE + PKG_LEN_SIZE + 1;

/// Tracker reply to a fetch query: group + ip + port
pub const QUERY_FETCH_BODY_LEN: usize = GROUP_NAME_MAX_LEN + IP_ADDRESS_SIZE + PKG_LEN_SIZE;
