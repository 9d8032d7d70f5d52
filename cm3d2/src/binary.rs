//! Little-endian primitive codec shared by every format.
//!
//! Strings are a base-128 varint byte length followed by raw UTF-8, no terminator.
//! The reader keeps an unbounded pushback buffer so that the next string can be inspected
//! before it is consumed; `peek_limit` only caps how large a peeked string may be.

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

/// Default upper bound, in bytes, for a single peeked string (length prefix included).
pub const DEFAULT_PEEK_LIMIT: usize = 1 << 20;

const MAX_VARINT_BYTES: usize = 5;
const READ_CHUNK: usize = 8 * 1024;
const MAX_READ_CHUNK: usize = 1 << 20;
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// Decodes a varint length from the front of `bytes`.
///
/// `Ok(None)` means the slice ended before the last varint byte.
fn decode_varint(bytes: &[u8], offset: u64) -> Result<Option<(usize, usize)>> {
    let mut value: u64 = 0;
    for (i, &b) in bytes.iter().take(MAX_VARINT_BYTES).enumerate() {
        value |= u64::from(b & 0x7F) << (7 * i);
        if b & 0x80 == 0 {
            if value > i32::MAX as u64 {
                return Err(Error::InvalidLength {
                    what: "string length",
                    length: value as i64,
                    offset,
                });
            }
            return Ok(Some((value as usize, i + 1)));
        }
    }
    if bytes.len() >= MAX_VARINT_BYTES {
        return Err(Error::InvalidLength {
            what: "string length varint",
            length: value as i64,
            offset,
        });
    }
    Ok(None)
}

fn encode_varint(mut value: u32, buf: &mut [u8; MAX_VARINT_BYTES]) -> usize {
    let mut n = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[n] = byte;
            return n + 1;
        }
        buf[n] = byte | 0x80;
        n += 1;
    }
}

/// Number of bytes the varint prefix of a `len`-byte string occupies.
pub fn varint_len(len: usize) -> usize {
    let mut buf = [0u8; MAX_VARINT_BYTES];
    encode_varint(len.min(i32::MAX as usize) as u32, &mut buf)
}

pub struct BinaryReader<R> {
    inner: R,
    lookahead: Vec<u8>,
    head: usize,
    position: u64,
    peek_limit: usize,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_peek_limit(inner, DEFAULT_PEEK_LIMIT)
    }

    pub fn with_peek_limit(inner: R, peek_limit: usize) -> Self {
        Self {
            inner,
            lookahead: Vec::new(),
            head: 0,
            position: 0,
            peek_limit,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn buffered(&self) -> usize {
        self.lookahead.len() - self.head
    }

    /// Pulls from the inner reader until `n` bytes are buffered or the stream ends.
    fn fill(&mut self, n: usize) -> Result<usize> {
        if self.head == self.lookahead.len() {
            self.lookahead.clear();
            self.head = 0;
        } else if self.head >= COMPACT_THRESHOLD {
            self.lookahead.drain(..self.head);
            self.head = 0;
        }

        while self.buffered() < n {
            let start = self.lookahead.len();
            let want = (n - self.buffered()).clamp(READ_CHUNK, MAX_READ_CHUNK);
            self.lookahead.resize(start + want, 0);
            match self.inner.read(&mut self.lookahead[start..]) {
                Ok(0) => {
                    self.lookahead.truncate(start);
                    break;
                }
                Ok(read) => self.lookahead.truncate(start + read),
                Err(e) if e.kind() == ErrorKind::Interrupted => self.lookahead.truncate(start),
                Err(e) => {
                    self.lookahead.truncate(start);
                    return Err(Error::Io(e));
                }
            }
        }
        Ok(self.buffered())
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let available = self.fill(n)?;
        if available < n {
            return Err(Error::TruncatedInput {
                offset: self.position,
                needed: n,
                available,
            });
        }
        let start = self.head;
        self.head += n;
        self.position += n as u64;
        Ok(&self.lookahead[start..start + n])
    }

    /// True when no further byte can be read.
    pub fn at_end(&mut self) -> Result<bool> {
        Ok(self.fill(1)? == 0)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0; N];
        LittleEndian::read_f32_into(self.take(4 * N)?, &mut out);
        Ok(out)
    }

    /// Reads an i32 element count, rejecting negative values.
    pub fn read_count(&mut self, what: &'static str) -> Result<usize> {
        let offset = self.position;
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| Error::InvalidLength {
            what,
            length: i64::from(count),
            offset,
        })
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = self.lookahead[self.head..].to_vec();
        self.lookahead.clear();
        self.head = 0;
        self.inner.read_to_end(&mut out)?;
        self.position += out.len() as u64;
        Ok(out)
    }

    fn string_header(&mut self) -> Result<(usize, usize)> {
        let offset = self.position;
        let available = self.fill(MAX_VARINT_BYTES)?;
        match decode_varint(&self.lookahead[self.head..], offset)? {
            Some(header) => Ok(header),
            None => Err(Error::TruncatedInput {
                offset,
                needed: available + 1,
                available,
            }),
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        let (len, prefix) = self.string_header()?;
        self.take(prefix)?;
        let offset = self.position;
        let bytes = self.take(len)?.to_vec();
        String::from_utf8(bytes).map_err(|source| Error::InvalidUtf8 { offset, source })
    }

    /// Returns the next string without consuming it.
    pub fn peek_string(&mut self) -> Result<String> {
        let offset = self.position;
        let (len, prefix) = self.string_header()?;
        let total = prefix + len;
        if total > self.peek_limit {
            return Err(Error::PeekOverflow {
                offset,
                length: len,
                limit: self.peek_limit,
            });
        }
        let available = self.fill(total)?;
        if available < total {
            return Err(Error::TruncatedInput {
                offset,
                needed: total,
                available,
            });
        }
        let start = self.head + prefix;
        String::from_utf8(self.lookahead[start..start + len].to_vec()).map_err(|source| {
            Error::InvalidUtf8 {
                offset: offset + prefix as u64,
                source,
            }
        })
    }

    /// Consumes the next string if it equals `sentinel`; otherwise leaves it in place.
    pub fn consume_sentinel(&mut self, sentinel: &str) -> Result<bool> {
        if self.peek_string()? == sentinel {
            self.read_string()?;
            return Ok(true);
        }
        Ok(false)
    }
}

pub struct BinaryWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_i32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner.write_f32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    pub fn write_f32_array<const N: usize>(&mut self, values: &[f32; N]) -> Result<()> {
        for &v in values {
            self.write_f32(v)?;
        }
        Ok(())
    }

    /// Writes an element count as i32, rejecting counts that do not fit.
    pub fn write_count(&mut self, what: &'static str, count: usize) -> Result<()> {
        let value = i32::try_from(count).map_err(|_| Error::InvalidLength {
            what,
            length: count as i64,
            offset: self.position,
        })?;
        self.write_i32(value)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Writes the varint length, then the body (omitted when empty).
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len())
            .ok()
            .filter(|&len| len <= i32::MAX as u32)
            .ok_or(Error::InvalidLength {
                what: "string length",
                length: value.len() as i64,
                offset: self.position,
            })?;
        let mut prefix = [0u8; MAX_VARINT_BYTES];
        let n = encode_varint(len, &mut prefix);
        self.write_bytes(&prefix[..n])?;
        if len > 0 {
            self.write_bytes(value.as_bytes())?;
        }
        Ok(())
    }
}
