pub mod constants;
pub mod error;
pub mod file_id;
pub mod header;

pub use constants::*;
pub use error::{FdfsError, ProtocolError, ValidationError};
pub use file_id::{split_file_id, FileId};
pub use header::{read_header, write_header, Header};
