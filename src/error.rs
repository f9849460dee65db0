/// Errors raised while laying out a new image.
///
/// Everything after construction is infallible: palette saturation and
/// unregistered indices are accepted as documented degraded behaviour.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Zero-sized images, or a pixel stream longer than a PNG chunk can hold.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Palette slots are addressed by a single byte.
    #[error("invalid palette capacity: {0} (expected 1..=256)")]
    InvalidPaletteCapacity(u16),
}
