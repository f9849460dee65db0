//! Structural verification of finished files.
//!
//! This walks the chunk sequence, checking every CRC, the header fields and
//! the stored zlib stream, without turning the stream back into pixels.
use anyhow::{anyhow, bail, ensure, Context};
use nom::{bytes::complete::tag, IResult};

use crate::{
    chunks::{ihdr, iter_chunks, plte::Entry, Chunk},
    image_data::parse_stored_stream,
    png::SIGNATURE,
    ColorType, Pixel,
};

/// What [`verify`] found in a well-formed indexed PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngSummary {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    /// Palette entries with the alpha the tRNS chunk assigns them.
    pub palette: Vec<Pixel>,
    pub chunk_types: Vec<[u8; 4]>,
    pub stored_blocks: usize,
    pub adler32: u32,
}

fn parse_signature(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag(&SIGNATURE[..])(input)
}

fn type_name(chunk_type: &[u8; 4]) -> String {
    String::from_utf8_lossy(chunk_type).into_owned()
}

/// Checks that `bytes` is an 8-bit indexed PNG whose chunks and zlib stream
/// are intact.
pub fn verify(bytes: &[u8]) -> anyhow::Result<PngSummary> {
    let (rest, _) = parse_signature(bytes)
        .map_err(|_| anyhow!("input doesn't start with the PNG signature"))?;
    let mut chunks = iter_chunks(rest);

    let header = match chunks.next() {
        Some(Ok(Chunk::IHDR(header))) => header,
        Some(Ok(other)) => bail!(
            "expected IHDR as the first chunk, found {}",
            type_name(&other.chunk_type())
        ),
        Some(Err(e)) => return Err(e.context("IHDR failed verification")),
        None => bail!("file has no chunks"),
    };
    ensure!(
        header.color_type == ColorType::IndexedColor && header.bit_depth == 8,
        "expected an 8-bit indexed image, found {:?} at depth {}",
        header.color_type,
        header.bit_depth
    );

    let mut chunk_types = vec![*ihdr::HEADER];
    let mut palette = None;
    let mut transparency = None;
    let mut stream = Vec::new();
    for chunk in chunks.by_ref() {
        let chunk = chunk.with_context(|| {
            format!("chunk {} failed verification", chunk_types.len())
        })?;
        chunk_types.push(chunk.chunk_type());
        match chunk {
            Chunk::IHDR(_) => bail!("duplicate IHDR chunk"),
            Chunk::PLTE(plte) => palette = Some(plte),
            Chunk::tRNS(trns) => transparency = Some(trns),
            Chunk::IDAT(idat) => stream.extend_from_slice(idat.data),
            Chunk::IEND | Chunk::Unknown(_) => (),
        }
    }
    ensure!(
        chunk_types.last() == Some(b"IEND"),
        "file ends without an IEND chunk"
    );
    ensure!(
        chunks.remainder().is_empty(),
        "{} bytes follow the IEND chunk",
        chunks.remainder().len()
    );

    let palette = palette.context("indexed image has no PLTE chunk")?;
    ensure!(
        (1..=256).contains(&palette.entries().len()),
        "PLTE holds {} entries",
        palette.entries().len()
    );
    let palette = palette
        .entries()
        .iter()
        .enumerate()
        .map(|(index, &Entry(red, green, blue))| {
            let alpha = transparency
                .as_ref()
                .map_or(u8::MAX, |trns| trns.as_palette(index as u8));
            Pixel::new(red, green, blue, alpha)
        })
        .collect();

    let stored = parse_stored_stream(&stream).context("IDAT stream failed verification")?;
    let expected = header.height as usize * (header.width as usize + 1);
    ensure!(
        stored.data_len == expected,
        "IDAT carries {} bytes, a {}x{} image needs {expected}",
        stored.data_len,
        header.width,
        header.height
    );

    Ok(PngSummary {
        width: header.width,
        height: header.height,
        bit_depth: header.bit_depth,
        color_type: header.color_type,
        palette,
        chunk_types,
        stored_blocks: stored.blocks,
        adler32: stored.adler32,
    })
}
