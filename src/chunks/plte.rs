use nom::{bytes::complete::take, combinator::map, multi::count, IResult};

use super::ParseableChunk;
use crate::layout::Region;

pub(crate) const HEADER: &[u8; 4] = b"PLTE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry(pub u8, pub u8, pub u8);

#[derive(Debug)]
pub struct PLTEChunk {
    colors: Vec<Entry>,
}
impl PLTEChunk {
    pub(crate) fn entries(&self) -> &[Entry] {
        &self.colors
    }

    /// Writes the RGB triplet of palette slot `slot`.
    pub(crate) fn write_entry(buffer: &mut [u8], region: Region, slot: u8, entry: Entry) {
        let offset = region.payload().start + 3 * slot as usize;
        buffer[offset..offset + 3].copy_from_slice(&[entry.0, entry.1, entry.2]);
    }

    pub(crate) fn read_entry(buffer: &[u8], region: Region, slot: u8) -> Entry {
        let offset = region.payload().start + 3 * slot as usize;
        Entry(buffer[offset], buffer[offset + 1], buffer[offset + 2])
    }
}
impl<'a> ParseableChunk<'a> for PLTEChunk {
    const HEADER: &'static [u8; 4] = HEADER;

    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        let entry_count = chunk_data.len() / 3;
        let (rest, entries) = count(
            map(take(3usize), |i: &[u8]| Entry(i[0], i[1], i[2])),
            entry_count,
        )(chunk_data)?;
        Ok((rest, PLTEChunk { colors: entries }))
    }
}
