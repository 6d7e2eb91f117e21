//! `group/relativePath` identifiers returned by uploads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::error::{FdfsError, ValidationError};

/// Split on the first `/`. The remote path may contain more separators.
pub fn split_file_id(file_id: &str) -> Result<(&str, &str), FdfsError> {
    file_id
        .split_once('/')
        .ok_or_else(|| ValidationError::MalformedFileId(file_id.to_string()).into())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    pub group: String,
    pub path: String,
}

impl FileId {
    pub fn new(group: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            path: path.into(),
        }
    }

    pub fn parse(file_id: &str) -> Result<Self, FdfsError> {
        let (group, path) = split_file_id(file_id)?;
        Ok(Self::new(group, path))
    }
}

impl FromStr for FileId {
    type Err = FdfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.path)
    }
}
