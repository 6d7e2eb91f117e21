//! Tracker queries that resolve a storage node.

use serde::Serialize;
use tracing::debug;

use crate::protocol::constants::{
    GROUP_NAME_MAX_LEN, IP_ADDRESS_SIZE, PKG_LEN_SIZE, QUERY_STORE_BODY_LEN,
};
use crate::protocol::error::{FdfsError, ProtocolError};
use crate::utils::buffer::{be_i64, fixed_str};

/// A storage node plus the store path to use on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    /// `host:port`
    pub addr: String,
    pub store_path_index: i8,
}

impl StorageInfo {
    pub fn new(addr: impl Into<String>, store_path_index: i8) -> Self {
        Self {
            addr: addr.into(),
            store_path_index,
        }
    }
}

/// Group, ip and port shared by both tracker replies.
fn parse_location(body: &[u8]) -> Result<(String, String), FdfsError> {
    let group = fixed_str(&body[..GROUP_NAME_MAX_LEN])?;
    let ip_end = GROUP_NAME_MAX_LEN + IP_ADDRESS_SIZE;
    let ip = fixed_str(&body[GROUP_NAME_MAX_LEN..ip_end])?;
    let port = be_i64(&body[ip_end..ip_end + PKG_LEN_SIZE]);
    if !(0..=i64::from(u16::MAX)).contains(&port) {
        return Err(ProtocolError::InvalidPort(port).into());
    }
    Ok((group, format!("{}:{}", ip, port)))
}

pub(super) fn parse_store_response(body: &[u8]) -> Result<StorageInfo, FdfsError> {
    let (group, addr) = parse_location(body)?;
    let store_path_index = body[QUERY_STORE_BODY_LEN - 1] as i8;
    debug!(
        "Tracker chose storage {} in {} (store path {})",
        addr, group, store_path_index
    );
    Ok(StorageInfo::new(addr, store_path_index))
}

pub(super) fn parse_fetch_response(body: &[u8]) -> Result<StorageInfo, FdfsError> {
    let (group, addr) = parse_location(body)?;
    debug!("Tracker resolved {} in {} for fetch", addr, group);
    Ok(StorageInfo::new(addr, 0))
}
