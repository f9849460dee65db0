use nom::{
    bytes::complete::{tag, take},
    combinator::{map, map_res},
    multi::length_data,
    number::complete::be_u32,
    sequence::{terminated, tuple},
    IResult,
};

use crate::{
    crc::calculate_crc,
    layout::Region,
    utils::put_be_u32,
};

pub(crate) mod idat;
pub(crate) mod iend;
pub(crate) mod ihdr;
pub(crate) mod plte;
pub(crate) mod trns;

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug)]
pub(crate) enum Chunk<'a> {
    IHDR(ihdr::IHDRChunk),
    PLTE(plte::PLTEChunk),
    tRNS(trns::tRNSChunk<'a>),
    IDAT(idat::IDATChunk<'a>),
    IEND,
    Unknown(RawChunk<'a>),
}

impl Chunk<'_> {
    pub(crate) fn chunk_type(&self) -> [u8; 4] {
        match self {
            Chunk::IHDR(_) => *ihdr::HEADER,
            Chunk::PLTE(_) => *plte::HEADER,
            Chunk::tRNS(_) => *trns::HEADER,
            Chunk::IDAT(_) => *idat::HEADER,
            Chunk::IEND => *iend::HEADER,
            Chunk::Unknown(raw) => *raw.chunk_type,
        }
    }
}

pub(crate) fn iter_chunks(source: &[u8]) -> ChunkIter {
    ChunkIter {
        source,
        finished: false,
    }
}

pub(crate) struct ChunkIter<'a> {
    source: &'a [u8],
    finished: bool,
}

impl<'a> ChunkIter<'a> {
    /// Bytes left over once IEND has been read.
    pub(crate) fn remainder(&self) -> &'a [u8] {
        self.source
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = anyhow::Result<Chunk<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match parse_chunk(self.source) {
            Ok((rest, chunk)) => {
                self.source = rest;
                if matches!(chunk, Chunk::IEND) {
                    self.finished = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.to_owned().into()))
            }
        }
    }
}

fn parse_chunk(input: &[u8]) -> IResult<&[u8], Chunk<'_>> {
    let (rest, (header, chunk_data)) = valid_chunk(input)?;
    let chunk = match header {
        ihdr::HEADER => Chunk::IHDR(ihdr::IHDRChunk::from_bytes(chunk_data)?.1),
        plte::HEADER => Chunk::PLTE(plte::PLTEChunk::from_bytes(chunk_data)?.1),
        trns::HEADER => Chunk::tRNS(trns::tRNSChunk::from_bytes(chunk_data)?.1),
        idat::HEADER => Chunk::IDAT(idat::IDATChunk::from_bytes(chunk_data)?.1),
        iend::HEADER => Chunk::IEND,
        _ => Chunk::Unknown(RawChunk {
            chunk_type: header,
            _chunk_data: chunk_data,
        }),
    };
    Ok((rest, chunk))
}

#[derive(Debug)]
pub(crate) struct RawChunk<'a> {
    chunk_type: &'a [u8; 4],
    _chunk_data: &'a [u8],
}

/// Splits off one chunk and checks its CRC, yielding the type tag and payload.
fn valid_chunk(input: &[u8]) -> IResult<&[u8], (&[u8; 4], &[u8])> {
    let (header_length, crc_length) = (4u32, 4u32);
    let (input, chunk_data) = length_data(map(be_u32, |v: u32| {
        v.saturating_add(header_length + crc_length)
    }))(input)?;
    let crc = calculate_crc(&chunk_data[..chunk_data.len() - crc_length as usize]).to_be_bytes();
    let (_, data) = tuple((
        map_res(take(header_length), <&[u8; 4]>::try_from),
        terminated(
            take(chunk_data.len() - (header_length + crc_length) as usize),
            tag(&crc[..]),
        ),
    ))(chunk_data)?;
    Ok((input, data))
}

/// Writes the CRC of `region`'s tag and payload into its trailing 4 bytes.
pub(crate) fn write_crc(buffer: &mut [u8], region: Region) -> u32 {
    let crc = calculate_crc(&buffer[region.checksummed()]);
    put_be_u32(buffer, region.crc_offset(), crc);
    crc
}

pub(crate) trait ParseableChunk<'a>: Sized {
    const HEADER: &'static [u8; 4];

    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self>;

    /// Writes the length field and type tag that open `region`.
    fn write_framing(buffer: &mut [u8], region: Region) {
        put_be_u32(buffer, region.offset, region.payload_len() as u32);
        buffer[region.tag()].copy_from_slice(Self::HEADER);
    }
}
