use super::ParseableChunk;

pub(crate) const HEADER: &[u8; 4] = b"IEND";

pub(crate) struct IENDChunk;
impl<'a> ParseableChunk<'a> for IENDChunk {
    const HEADER: &'static [u8; 4] = HEADER;

    fn from_bytes(chunk_data: &[u8]) -> nom::IResult<&[u8], Self> {
        Ok((chunk_data, Self))
    }
}
