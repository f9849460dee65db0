use std::collections::HashMap;

use base64::Engine;

use crate::{
    chunks::{
        idat::IDATChunk,
        iend::IENDChunk,
        ihdr::IHDRChunk,
        plte::{Entry, PLTEChunk},
        trns::tRNSChunk,
        write_crc, ParseableChunk,
    },
    error::Error,
    image_data::{write_adler, write_stream_framing},
    layout::Layout,
    pixel::Pixel,
};

/// The 8-byte PNG file signature.
pub const SIGNATURE: [u8; 8] = *b"\x89PNG\x0d\x0a\x1a\x0a";

/// An 8-bit palette image painted index by index and serialized without
/// compression.
///
/// The whole file is allocated up front: every chunk, the zlib framing and the
/// stored-block headers sit at fixed offsets, so painting a pixel is a single
/// byte write and [`IndexedPng::finalize`] only has to fill in checksums.
///
/// ```
/// use indexed_png::IndexedPng;
///
/// let mut png = IndexedPng::new(2, 2, 4)?;
/// let black = png.register_opaque(0, 0, 0);
/// let white = png.register_opaque(255, 255, 255);
/// png.write_pixel(0, 0, black);
/// png.write_pixel(1, 0, white);
/// png.write_pixel(0, 1, white);
/// png.write_pixel(1, 1, black);
/// assert!(png.to_base64().starts_with("iVBORw0KGgo"));
/// # Ok::<(), indexed_png::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct IndexedPng {
    layout: Layout,
    buffer: Box<[u8]>,
    palette: HashMap<u32, u8>,
    next_slot: u16,
}

impl IndexedPng {
    /// Lays out an image of `width` x `height` pixels with room for
    /// `palette_capacity` colors.
    ///
    /// The capacity sizes the PLTE and tRNS chunks; the bit depth is always 8.
    pub fn new(width: u32, height: u32, palette_capacity: u16) -> Result<Self, Error> {
        let layout = Layout::new(width, height, palette_capacity)?;
        log::debug!(
            "laying out {width}x{height} image: {} bytes, {} stored block(s), {palette_capacity} palette slots",
            layout.total_size() + SIGNATURE.len(),
            layout.stored_blocks,
        );

        let mut buffer = vec![0; layout.total_size()].into_boxed_slice();
        IHDRChunk::indexed(width, height).write(&mut buffer, layout.ihdr);
        PLTEChunk::write_framing(&mut buffer, layout.plte);
        tRNSChunk::write_framing(&mut buffer, layout.trns);
        IDATChunk::write_framing(&mut buffer, layout.idat);
        IENDChunk::write_framing(&mut buffer, layout.iend);
        write_stream_framing(&mut buffer, &layout);

        Ok(Self {
            layout,
            buffer,
            palette: HashMap::with_capacity(palette_capacity as usize),
            next_slot: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn palette_capacity(&self) -> u16 {
        self.layout.palette_capacity
    }

    /// Number of palette slots handed out so far.
    pub fn palette_len(&self) -> usize {
        self.next_slot as usize
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the palette index for a color, assigning the next free slot the
    /// first time the color is seen.
    ///
    /// Once every slot is taken, unseen colors map to index 0 and are not
    /// recorded. The image stays valid, it just shows the wrong color.
    pub fn register_color(&mut self, red: u8, green: u8, blue: u8, alpha: u8) -> u8 {
        self.register_pixel(Pixel::new(red, green, blue, alpha))
    }

    pub fn register_opaque(&mut self, red: u8, green: u8, blue: u8) -> u8 {
        self.register_pixel(Pixel::opaque(red, green, blue))
    }

    pub fn register_pixel(&mut self, color: Pixel) -> u8 {
        let key = color.key();
        if let Some(&index) = self.palette.get(&key) {
            return index;
        }
        if self.next_slot == self.layout.palette_capacity {
            log::debug!("palette full, {color:?} aliases slot 0");
            return 0;
        }

        let slot = self.next_slot as u8;
        PLTEChunk::write_entry(
            &mut self.buffer,
            self.layout.plte,
            slot,
            Entry(color.red, color.green, color.blue),
        );
        tRNSChunk::write_alpha(&mut self.buffer, self.layout.trns, slot, color.alpha);
        self.palette.insert(key, slot);
        self.next_slot += 1;
        log::trace!("registered {color:?} as palette slot {slot}");
        slot
    }

    /// Registered colors in slot order.
    pub fn palette(&self) -> Vec<Pixel> {
        (0..self.next_slot)
            .map(|slot| {
                let slot = slot as u8;
                let Entry(red, green, blue) =
                    PLTEChunk::read_entry(&self.buffer, self.layout.plte, slot);
                let alpha = tRNSChunk::read_alpha(&self.buffer, self.layout.trns, slot);
                Pixel::new(red, green, blue, alpha)
            })
            .collect()
    }

    /// Offset of pixel `(x, y)` inside the image buffer (signature excluded).
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        self.layout.pixel_offset(x, y)
    }

    /// Offset of the filter-type byte that leads row `y`.
    pub fn filter_offset(&self, y: u32) -> usize {
        self.layout.filter_offset(y)
    }

    /// Sets pixel `(x, y)` to a palette index. The index is not checked
    /// against the registered palette.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn write_pixel(&mut self, x: u32, y: u32, index: u8) {
        self.check_bounds(x, y);
        let offset = self.layout.pixel_offset(x, y);
        self.buffer[offset] = index;
    }

    /// Palette index currently stored at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.check_bounds(x, y);
        self.buffer[self.layout.pixel_offset(x, y)]
    }

    /// Paints every pixel, row by row, with the index returned by `paint`.
    pub fn fill(&mut self, mut paint: impl FnMut(u32, u32) -> u8) {
        for y in 0..self.layout.height {
            for x in 0..self.layout.width {
                let offset = self.layout.pixel_offset(x, y);
                self.buffer[offset] = paint(x, y);
            }
        }
    }

    fn check_bounds(&self, x: u32, y: u32) {
        assert!(
            x < self.layout.width && y < self.layout.height,
            "pixel ({x}, {y}) is outside the {}x{} image",
            self.layout.width,
            self.layout.height
        );
    }

    /// Fills in the Adler-32 and every chunk CRC, then returns the complete
    /// file. Can be called again after further painting.
    pub fn finalize(&mut self) -> Vec<u8> {
        let adler = write_adler(&mut self.buffer, &self.layout);
        log::trace!("stream adler32 {adler:#010x}");
        for region in self.layout.regions() {
            let crc = write_crc(&mut self.buffer, region);
            log::trace!("chunk at {} crc {crc:#010x}", region.offset);
        }

        let mut bytes = Vec::with_capacity(SIGNATURE.len() + self.buffer.len());
        bytes.extend_from_slice(&SIGNATURE);
        bytes.extend_from_slice(&self.buffer);
        bytes
    }

    /// The finalized file in standard, padded base64.
    pub fn to_base64(&mut self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.finalize())
    }

    /// The finalized file as a `data:` URI for embedding in HTML or CSS.
    pub fn to_data_uri(&mut self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}
