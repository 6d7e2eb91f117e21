use crate::protocol::error::ProtocolError;

/// Growable request body with the fixed-width field encodings the protocol uses
#[derive(Debug, Default)]
pub struct ByteBuffer {
    buf: Vec<u8>,
}

impl ByteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write `value` into exactly `width` bytes, NUL-padded. Longer input is cut.
    pub fn put_fixed(&mut self, value: &[u8], width: usize) {
        let n = value.len().min(width);
        self.buf.extend_from_slice(&value[..n]);
        self.buf.resize(self.buf.len() + (width - n), 0);
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Text of a NUL-padded fixed-width field.
pub fn fixed_str(field: &[u8]) -> Result<String, ProtocolError> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_string)
        .map_err(|_| ProtocolError::InvalidUtf8)
}

pub fn be_i64(field: &[u8]) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&field[..8]);
    i64::from_be_bytes(bytes)
}
