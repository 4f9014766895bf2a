use std::io::{ErrorKind, Read};

use bytes::Buf;

use super::error::{Result, SlotDbError};

/// Fails with `Truncated` unless `buf` still holds `expected` bytes.
pub(crate) fn ensure_remaining<B: Buf>(buf: &B, expected: usize) -> Result<()> {
    let available = buf.remaining();
    if available < expected {
        return Err(SlotDbError::Truncated {
            expected,
            available,
        });
    }
    Ok(())
}

/// Reads until `buf` is full or the reader reaches end of input.
/// Returns the number of bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Fills `buf` from a stream, reporting a short stream as `Truncated`.
pub(crate) fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let read = read_full(reader, buf)?;
    if read < buf.len() {
        return Err(SlotDbError::Truncated {
            expected: buf.len(),
            available: read,
        });
    }
    Ok(())
}
