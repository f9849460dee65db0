//! Byte layout of an indexed PNG with a stored (uncompressed) zlib stream.
//!
//! All offsets are relative to the start of the IHDR chunk, i.e. they exclude
//! the 8-byte signature that is only prepended when the image is finalized.
use std::ops::Range;

use crate::{error::Error, utils::div_ceil};

/// Largest payload a single stored deflate block can carry.
pub const MAX_STORED_BLOCK: usize = 0xffff;
/// BFINAL/BTYPE byte, LEN and NLEN.
pub const STORED_BLOCK_HEADER: usize = 5;
pub(crate) const ZLIB_HEADER_LEN: usize = 2;
pub(crate) const ADLER_LEN: usize = 4;
// Length, type tag and CRC around every chunk payload.
const CHUNK_FRAMING: usize = 4 + 4 + 4;
const IHDR_PAYLOAD: usize = 13;
// Chunk lengths and image dimensions are limited to 2^31 - 1.
const MAX_PNG_U32: usize = i32::MAX as usize;

/// Position of one chunk inside the image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub size: usize,
}

impl Region {
    fn after(previous: Region, payload_len: usize) -> Self {
        Self {
            offset: previous.offset + previous.size,
            size: CHUNK_FRAMING + payload_len,
        }
    }

    pub fn payload_len(&self) -> usize {
        self.size - CHUNK_FRAMING
    }

    pub fn tag(&self) -> Range<usize> {
        self.offset + 4..self.offset + 8
    }

    pub fn payload(&self) -> Range<usize> {
        self.offset + 8..self.offset + self.size - 4
    }

    /// Type tag plus payload, the bytes covered by the chunk CRC.
    pub fn checksummed(&self) -> Range<usize> {
        self.offset + 4..self.offset + self.size - 4
    }

    pub fn crc_offset(&self) -> usize {
        self.offset + self.size - 4
    }
}

/// One stored deflate block inside the IDAT payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlock {
    /// Offset of the 5-byte block header.
    pub header: usize,
    /// Range of the filter and palette index bytes the block carries.
    pub data: Range<usize>,
    pub is_final: bool,
}

impl StoredBlock {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Offsets and sizes of every chunk, computed once from the image dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub palette_capacity: u16,
    /// Filter bytes plus palette indices: `height * (width + 1)`.
    pub pixel_bytes: usize,
    pub stored_blocks: usize,
    pub ihdr: Region,
    pub plte: Region,
    pub trns: Region,
    pub idat: Region,
    pub iend: Region,
}

impl Layout {
    pub fn new(width: u32, height: u32, palette_capacity: u16) -> Result<Self, Error> {
        let invalid = || Error::InvalidDimensions { width, height };
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        if width as usize > MAX_PNG_U32 || height as usize > MAX_PNG_U32 {
            return Err(invalid());
        }
        if !(1..=256).contains(&palette_capacity) {
            return Err(Error::InvalidPaletteCapacity(palette_capacity));
        }

        let pixel_bytes = (width as usize + 1)
            .checked_mul(height as usize)
            .ok_or_else(invalid)?;
        let stored_blocks = div_ceil(pixel_bytes, MAX_STORED_BLOCK);
        let stream_len = stored_blocks
            .checked_mul(STORED_BLOCK_HEADER)
            .and_then(|headers| headers.checked_add(pixel_bytes))
            .and_then(|len| len.checked_add(ZLIB_HEADER_LEN + ADLER_LEN))
            .filter(|&len| len <= MAX_PNG_U32)
            .ok_or_else(invalid)?;

        let capacity = palette_capacity as usize;
        let ihdr = Region {
            offset: 0,
            size: CHUNK_FRAMING + IHDR_PAYLOAD,
        };
        let plte = Region::after(ihdr, 3 * capacity);
        let trns = Region::after(plte, capacity);
        let idat = Region::after(trns, stream_len);
        let iend = Region::after(idat, 0);

        Ok(Self {
            width,
            height,
            palette_capacity,
            pixel_bytes,
            stored_blocks,
            ihdr,
            plte,
            trns,
            idat,
            iend,
        })
    }

    pub fn regions(&self) -> [Region; 5] {
        [self.ihdr, self.plte, self.trns, self.idat, self.iend]
    }

    pub fn total_size(&self) -> usize {
        self.iend.offset + self.iend.size
    }

    /// First byte of the zlib stream.
    pub fn stream_start(&self) -> usize {
        self.idat.payload().start
    }

    pub fn adler_offset(&self) -> usize {
        self.idat.crc_offset() - ADLER_LEN
    }

    /// Buffer offset of the `linear`-th filter/index byte of the stream.
    pub fn stream_offset(&self, linear: usize) -> usize {
        self.stream_start()
            + ZLIB_HEADER_LEN
            + STORED_BLOCK_HEADER * (linear / MAX_STORED_BLOCK + 1)
            + linear
    }

    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        self.stream_offset(self.row_start(y) + x as usize + 1)
    }

    /// Offset of the filter-type byte leading row `y`.
    pub fn filter_offset(&self, y: u32) -> usize {
        self.stream_offset(self.row_start(y))
    }

    fn row_start(&self, y: u32) -> usize {
        y as usize * (self.width as usize + 1)
    }

    pub fn stored_block(&self, index: usize) -> StoredBlock {
        let header = self.stream_start()
            + ZLIB_HEADER_LEN
            + index * (MAX_STORED_BLOCK + STORED_BLOCK_HEADER);
        let consumed = index * MAX_STORED_BLOCK;
        let len = usize::min(MAX_STORED_BLOCK, self.pixel_bytes - consumed);
        let start = header + STORED_BLOCK_HEADER;
        StoredBlock {
            header,
            data: start..start + len,
            is_final: index + 1 == self.stored_blocks,
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = StoredBlock> + '_ {
        (0..self.stored_blocks).map(|index| self.stored_block(index))
    }
}
