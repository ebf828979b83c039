use tracing::debug;

use crate::address::COPIER_HEADER;
use crate::error::{DumpError, Result};
use crate::tables::RomInfo;

/// Forward-reading view over ROM bytes. Reads are little-endian.
pub trait ByteSource {
    /// Current file offset.
    fn tell(&self) -> u32;
    fn seek(&mut self, offset: u32);
    fn read_u8(&mut self) -> Result<u8>;

    fn read_u16(&mut self) -> Result<u16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read_u24(&mut self) -> Result<u32> {
        let b0 = self.read_u8()?;
        let b1 = self.read_u8()?;
        let b2 = self.read_u8()?;
        Ok(u32::from_le_bytes([b0, b1, b2, 0]))
    }
}

/// A validated ROM image, possibly preceded by a copier header.
#[derive(Debug, Clone)]
pub struct Rom {
    bytes: Vec<u8>,
    header: u32,
}

impl Rom {
    /// Looks for `info.data` at `info.offset`, then again past a copier
    /// header. Anything else is not the ROM the tables describe.
    pub fn open(bytes: Vec<u8>, info: &RomInfo) -> Result<Self> {
        for header in [0, COPIER_HEADER] {
            let Some(at) = info.offset.checked_add(header) else { continue };
            let at = at as usize;
            let found = at.checked_add(info.data.len()).and_then(|end| bytes.get(at..end));
            if found == Some(info.data.as_slice()) {
                debug!(header, "ROM signature matched");
                return Ok(Self { bytes, header });
            }
        }
        Err(DumpError::InvalidRom { name: info.name.clone() })
    }

    pub fn header(&self) -> u32 {
        self.header
    }

    pub fn cursor(&self) -> RomCursor<'_> {
        RomCursor { bytes: &self.bytes, pos: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct RomCursor<'a> {
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> RomCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl ByteSource for RomCursor<'_> {
    fn tell(&self) -> u32 {
        self.pos
    }

    fn seek(&mut self, offset: u32) {
        self.pos = offset;
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self
            .bytes
            .get(self.pos as usize)
            .ok_or(DumpError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> RomInfo {
        RomInfo { name: "KIRBY SUPER DELUXE".into(), offset: 4, data: vec![0xAA, 0xBB] }
    }

    #[test]
    fn plain_rom_has_no_header() {
        let rom = Rom::open(vec![0, 0, 0, 0, 0xAA, 0xBB, 0], &info()).unwrap();
        assert_eq!(rom.header(), 0);
    }

    #[test]
    fn copier_header_is_detected() {
        let mut bytes = vec![0u8; 0x210];
        bytes[0x204] = 0xAA;
        bytes[0x205] = 0xBB;
        let rom = Rom::open(bytes, &info()).unwrap();
        assert_eq!(rom.header(), COPIER_HEADER);
    }

    #[test]
    fn wrong_rom_is_rejected() {
        let err = Rom::open(vec![0; 8], &info()).unwrap_err();
        assert_eq!(err.to_string(), "The ROM does not seem to be a valid KIRBY SUPER DELUXE ROM.");
    }

    #[test]
    fn signature_offset_near_u32_max_is_rejected() {
        let info = RomInfo { offset: u32::MAX, ..info() };
        assert!(matches!(Rom::open(vec![0xAA; 16], &info), Err(DumpError::InvalidRom { .. })));
        let info = RomInfo { offset: u32::MAX - COPIER_HEADER, ..self::info() };
        assert!(matches!(Rom::open(vec![0xAA; 16], &info), Err(DumpError::InvalidRom { .. })));
    }

    #[test]
    fn cursor_reads_little_endian() {
        let bytes = [0x34, 0x12, 0x56, 0x34, 0x12];
        let mut c = RomCursor::new(&bytes);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u24().unwrap(), 0x12_3456);
        assert_eq!(c.tell(), 5);
        assert!(matches!(c.read_u8(), Err(DumpError::UnexpectedEof { offset: 5 })));
    }
}
