//! Write queue entries

use bytes::Bytes;

/// One serialized event waiting to be written
///
/// `payload` is the complete on-disk record, trailing newline included, and
/// `length` is its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub payload: Bytes,
    pub length: u64,
}

impl QueueEntry {
    /// Build an entry from a serialized line, appending the record terminator
    pub fn from_line(line: &str) -> Self {
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');
        Self::from_bytes(Bytes::from(record))
    }

    /// Build an entry from an already-terminated record
    pub fn from_bytes(payload: Bytes) -> Self {
        let length = payload.len() as u64;
        Self { payload, length }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_appends_newline() {
        let entry = QueueEntry::from_line(r#"{"id":1}"#);
        assert_eq!(&entry.payload[..], b"{\"id\":1}\n");
        assert_eq!(entry.length, 9);
    }

    #[test]
    fn test_length_counts_bytes_not_chars() {
        let entry = QueueEntry::from_line("\"é\"");
        assert_eq!(entry.length, 5);
    }
}
