use crate::error::{Error, Result};
use crate::header::ObjectClass;
use byteorder::{ReadBytesExt, BE, LE};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

/// Byte order of every multi-byte field after the identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}

/// Seek/read primitives over a random-access byte source.
///
/// Integer reads honour the cursor's current [`Endianness`]. I/O failures are
/// translated into [`Error::Truncated`] / [`Error::SeekFailed`] carrying the offset
/// at which the read or seek was attempted.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    endian: Endianness,
}

impl<R: Read + Seek> ByteCursor<R> {
    pub fn new(inner: R, endian: Endianness) -> Self {
        Self { inner, endian }
    }

    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    pub fn set_endianness(&mut self, endian: Endianness) {
        self.endian = endian;
    }

    /// Current absolute position in the source.
    pub fn position(&mut self) -> Result<u64> {
        self.inner
            .stream_position()
            .map_err(|source| Error::Position { source })
    }

    /// Moves to an absolute offset.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map(|_| ())
            .map_err(|source| Error::SeekFailed { offset, source })
    }

    /// Fills `buf` completely or fails with [`Error::Truncated`].
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.position()?;
        self.inner
            .read_exact(buf)
            .map_err(|e| map_read_error(e, offset, buf.len() as u64))
    }

    /// Reads exactly `len` bytes into a fresh buffer.
    ///
    /// The buffer grows with the data actually delivered, so a corrupt length
    /// cannot force a huge allocation up front.
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let offset = self.position()?;
        let buf = self.read_up_to(len)?;
        if (buf.len() as u64) < len {
            return Err(Error::Truncated {
                offset,
                wanted: len,
            });
        }
        Ok(buf)
    }

    /// Reads at most `len` bytes, stopping early at the end of the source.
    pub fn read_up_to(&mut self, len: u64) -> Result<Vec<u8>> {
        let offset = self.position()?;
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(len)
            .read_to_end(&mut buf)
            .map_err(|source| Error::Io { offset, source })?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let offset = self.position()?;
        self.inner
            .read_u8()
            .map_err(|e| map_read_error(e, offset, 1))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let offset = self.position()?;
        match self.endian {
            Endianness::Little => self.inner.read_u16::<LE>(),
            Endianness::Big => self.inner.read_u16::<BE>(),
        }
        .map_err(|e| map_read_error(e, offset, 2))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let offset = self.position()?;
        match self.endian {
            Endianness::Little => self.inner.read_u32::<LE>(),
            Endianness::Big => self.inner.read_u32::<BE>(),
        }
        .map_err(|e| map_read_error(e, offset, 4))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let offset = self.position()?;
        match self.endian {
            Endianness::Little => self.inner.read_u64::<LE>(),
            Endianness::Big => self.inner.read_u64::<BE>(),
        }
        .map_err(|e| map_read_error(e, offset, 8))
    }

    /// Reads an address/offset sized field: 4 bytes for 32-bit objects, 8 for 64-bit.
    pub fn read_word(&mut self, class: ObjectClass) -> Result<u64> {
        match class {
            ObjectClass::Elf32 => self.read_u32().map(u64::from),
            ObjectClass::Elf64 => self.read_u64(),
        }
    }
}

fn map_read_error(err: io::Error, offset: u64, wanted: u64) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Truncated { offset, wanted }
    } else {
        Error::Io {
            offset,
            source: err,
        }
    }
}
