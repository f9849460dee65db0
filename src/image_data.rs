//! The zlib stream carried by IDAT, made only of stored deflate blocks.
use anyhow::{ensure, Context};
use nom::{
    bytes::complete::take,
    number::complete::{be_u16, be_u32, le_u16, u8},
    sequence::tuple,
    IResult,
};

use crate::{adler::Adler32, layout::Layout, utils::put_be_u32, utils::put_le_u16};

/// Deflate with a 32 KiB window and the "maximum compression" level flag.
pub(crate) const ZLIB_HEADER: [u8; 2] = zlib_header(0x78, 3 << 6);

/// Fills in FCHECK so that `CMF * 256 + FLG` is a multiple of 31.
const fn zlib_header(cmf: u8, flags: u8) -> [u8; 2] {
    let value = ((cmf as u16) << 8) | flags as u16;
    let check = (31 - value % 31) % 31;
    [cmf, flags | check as u8]
}

/// Writes the zlib header and the header of every stored block.
pub(crate) fn write_stream_framing(buffer: &mut [u8], layout: &Layout) {
    let start = layout.stream_start();
    buffer[start..start + ZLIB_HEADER.len()].copy_from_slice(&ZLIB_HEADER);
    for block in layout.blocks() {
        let len = block.len() as u16;
        buffer[block.header] = block.is_final as u8;
        put_le_u16(buffer, block.header + 1, len);
        put_le_u16(buffer, block.header + 3, !len);
    }
}

/// Adler-32 of the filter and index bytes, skipping every block header.
pub(crate) fn stream_adler(buffer: &[u8], layout: &Layout) -> u32 {
    let mut adler = Adler32::new();
    for block in layout.blocks() {
        adler.update(&buffer[block.data]);
    }
    adler.finish()
}

pub(crate) fn write_adler(buffer: &mut [u8], layout: &Layout) -> u32 {
    let adler = stream_adler(buffer, layout);
    put_be_u32(buffer, layout.adler_offset(), adler);
    adler
}

/// What a well-formed stored stream contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StoredStream {
    pub(crate) blocks: usize,
    pub(crate) data_len: usize,
    pub(crate) adler32: u32,
}

fn stream_header(input: &[u8]) -> IResult<&[u8], u16> {
    be_u16(input)
}

fn block_header(input: &[u8]) -> IResult<&[u8], (u8, u16, u16)> {
    tuple((u8, le_u16, le_u16))(input)
}

fn block_data(input: &[u8], len: u16) -> IResult<&[u8], &[u8]> {
    take(len)(input)
}

fn stream_trailer(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

/// Validates a zlib stream made of stored blocks without inflating anything
/// beyond the checksum.
pub(crate) fn parse_stored_stream(stream: &[u8]) -> anyhow::Result<StoredStream> {
    let (mut input, header) = stream_header(stream)
        .map_err(|e| e.to_owned())
        .context("zlib stream is missing its header")?;
    ensure!(header % 31 == 0, "zlib header check failed ({header:#06x})");
    ensure!((header >> 8) & 0x0f == 8, "zlib stream does not use deflate");
    ensure!(header & 0x20 == 0, "preset dictionaries are not supported");

    let mut adler = Adler32::new();
    let mut blocks = 0;
    let mut data_len = 0;
    loop {
        let (rest, (flags, len, nlen)) = block_header(input)
            .map_err(|e| e.to_owned())
            .with_context(|| format!("block {blocks} header is truncated"))?;
        ensure!(
            flags & 0b110 == 0,
            "block {blocks} is not a stored block (header byte {flags:#04x})"
        );
        ensure!(
            len == !nlen,
            "block {blocks} LEN {len:#06x} does not match NLEN {nlen:#06x}"
        );
        let (rest, data) = block_data(rest, len)
            .map_err(|e| e.to_owned())
            .with_context(|| format!("block {blocks} is shorter than {len} bytes"))?;
        adler.update(data);
        blocks += 1;
        data_len += data.len();
        input = rest;
        if flags & 1 == 1 {
            break;
        }
    }

    let (rest, stored) = stream_trailer(input)
        .map_err(|e| e.to_owned())
        .context("zlib stream is missing its Adler-32 trailer")?;
    ensure!(
        rest.is_empty(),
        "{} bytes follow the final block's trailer",
        rest.len()
    );
    let adler32 = adler.finish();
    ensure!(
        adler32 == stored,
        "Adler-32 mismatch: stored {stored:#010x}, computed {adler32:#010x}"
    );
    Ok(StoredStream {
        blocks,
        data_len,
        adler32,
    })
}
