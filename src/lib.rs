//! Byte-exact PNG encoding for small palette images, with no compression
//! library involved.
//!
//! [`IndexedPng`] allocates the complete file up front, lets callers build a
//! palette and paint pixels by index, then fills in the Adler-32 and CRC-32
//! checksums on [`IndexedPng::finalize`]. The pixel data is written as stored
//! (uncompressed) deflate blocks.
mod adler;
mod chunks;
mod crc;
mod error;
mod image_data;
pub mod inspect;
mod layout;
mod pixel;
mod png;
mod utils;

pub use chunks::ihdr::ColorType;
pub use error::Error;
pub use layout::{Layout, Region, StoredBlock, MAX_STORED_BLOCK, STORED_BLOCK_HEADER};
pub use pixel::Pixel;
pub use png::{IndexedPng, SIGNATURE};
