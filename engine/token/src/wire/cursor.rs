// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Bounds-checked cursors over byte slices.

use super::WireError;
use super::WireResult;

/// Write cursor over a mutable byte slice.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Writer { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn need(&self, n: usize) -> WireResult<()> {
        if self.remaining() < n {
            return Err(WireError::Overrun {
                needed: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Append one byte.
    pub fn put_u8(&mut self, v: u8) -> WireResult<()> {
        self.need(1)?;
        self.buf[self.pos] = v;
        self.pos += 1;
        Ok(())
    }

    /// Append a little-endian u16.
    pub fn put_u16_le(&mut self, v: u16) -> WireResult<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    /// Append a little-endian u32.
    pub fn put_u32_le(&mut self, v: u32) -> WireResult<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    /// Append a byte run.
    pub fn put_bytes(&mut self, v: &[u8]) -> WireResult<()> {
        self.need(v.len())?;
        self.buf[self.pos..self.pos + v.len()].copy_from_slice(v);
        self.pos += v.len();
        Ok(())
    }

    /// Append `n` zero bytes.
    pub fn put_zeroes(&mut self, n: usize) -> WireResult<()> {
        self.need(n)?;
        self.buf[self.pos..self.pos + n].fill(0);
        self.pos += n;
        Ok(())
    }

    /// Append `v` reversed, so an MSB-first number lands LSB-first.
    pub fn put_reversed(&mut self, v: &[u8]) -> WireResult<()> {
        self.need(v.len())?;
        for (i, b) in v.iter().rev().enumerate() {
            self.buf[self.pos + i] = *b;
        }
        self.pos += v.len();
        Ok(())
    }
}

/// Read cursor over a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn need(&self, n: usize) -> WireResult<()> {
        if self.remaining() < n {
            return Err(WireError::Overrun {
                needed: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read one byte.
    pub fn get_u8(&mut self) -> WireResult<u8> {
        self.need(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    /// Read a little-endian u16.
    pub fn get_u16_le(&mut self) -> WireResult<u16> {
        let b = self.get_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian u32.
    pub fn get_u32_le(&mut self) -> WireResult<u32> {
        let b = self.get_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a byte run of length `n`.
    pub fn get_bytes(&mut self, n: usize) -> WireResult<&'a [u8]> {
        self.need(n)?;
        let v = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(v)
    }
}
