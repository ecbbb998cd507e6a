use std::io::{self, Cursor};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use image::{ImageFormat, RgbaImage};

/// A PNG-encoded image as it travels between the canvas, the session and the
/// model gateway. Uploads in other formats are normalized to RGBA8 PNG on the
/// way in; everything downstream can assume PNG.
#[derive(Clone, PartialEq, Eq)]
pub struct PngImage(Vec<u8>);

impl PngImage {
    pub fn from_rgba(image: &RgbaImage) -> io::Result<Self> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self(bytes))
    }

    /// Accepts raw base64 with or without a `data:*;base64,` prefix.
    pub fn from_base64(payload: &str) -> io::Result<Self> {
        let stripped = strip_data_uri(payload);
        let bytes = BASE64_STANDARD
            .decode(stripped.trim())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self(bytes))
    }

    pub fn decode(&self) -> io::Result<RgbaImage> {
        Ok(image::load_from_memory(&self.0)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
            .to_rgba8())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Bare base64, the form the provider expects in `inline_data` parts.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }
}

impl std::fmt::Debug for PngImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PngImage({} bytes)", self.0.len())
    }
}

/// Strips a `data:<mime>;base64,` prefix if present.
pub fn strip_data_uri(payload: &str) -> &str {
    match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    }
}

/// Draws `overlay` on top of `original` with normal alpha-over blending,
/// straight alpha on both sides, so photos with transparent pixels pick up
/// the marker's coverage too. Both buffers must share dimensions; output
/// keeps the original's resolution.
pub fn flatten(original: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    debug_assert_eq!(original.dimensions(), overlay.dimensions());
    let mut out = original.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        let sa = src.0[3] as u32;
        if sa == 0 {
            continue;
        }
        let da = dst.0[3] as u32;
        let inv = 255 - sa;
        // Output alpha kept scaled by 255 for integer math.
        let out_a = sa * 255 + da * inv;
        for c in 0..3 {
            dst.0[c] =
                ((src.0[c] as u32 * sa * 255 + dst.0[c] as u32 * da * inv) / out_a) as u8;
        }
        dst.0[3] = (out_a / 255) as u8;
    }
    out
}
