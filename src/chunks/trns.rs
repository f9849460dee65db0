use nom::IResult;

use super::ParseableChunk;
use crate::layout::Region;

pub(crate) const HEADER: &[u8; 4] = b"tRNS";

#[allow(non_camel_case_types)]
#[derive(Debug)]
pub struct tRNSChunk<'a> {
    inner: &'a [u8],
}
impl<'a> tRNSChunk<'a> {
    /// Alpha of a palette entry. Entries past the end of the chunk are opaque.
    pub(crate) fn as_palette(&self, index: u8) -> u8 {
        *self.inner.get(index as usize).unwrap_or(&255)
    }

    pub(crate) fn write_alpha(buffer: &mut [u8], region: Region, slot: u8, alpha: u8) {
        buffer[region.payload().start + slot as usize] = alpha;
    }

    pub(crate) fn read_alpha(buffer: &[u8], region: Region, slot: u8) -> u8 {
        buffer[region.payload().start + slot as usize]
    }
}
impl<'a> ParseableChunk<'a> for tRNSChunk<'a> {
    const HEADER: &'static [u8; 4] = HEADER;

    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        Ok((&chunk_data[0..0], tRNSChunk { inner: chunk_data }))
    }
}
