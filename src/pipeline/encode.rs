//! Image encoding: uploaded PNG/JPEG bytes → base64 `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. Scans are forwarded as uploaded (no re-encoding) so the model sees
//! exactly the pixels the user sent; only the MIME type is sniffed from the
//! magic bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The two raster formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Sniff the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// Wrap a scanned image for the vision API.
///
/// Returns `None` when the bytes are neither PNG nor JPEG.
/// `detail: "high"` keeps small print legible for tiling models.
pub fn encode_image(bytes: &[u8]) -> Option<ImageData> {
    let kind = ImageKind::detect(bytes)?;
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} image → {} bytes base64", kind.mime_type(), b64.len());
    Some(ImageData::new(b64, kind.mime_type()).with_detail("high"))
}

#[cfg(test)]
pub(crate) fn tiny_png() -> Vec<u8> {
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_png_scan() {
        let png = tiny_png();
        let data = encode_image(&png).expect("png is accepted");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, png);
    }

    #[test]
    fn jpeg_magic_is_detected() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(ImageKind::detect(&jpeg_header), Some(ImageKind::Jpeg));
    }

    #[test]
    fn other_bytes_are_rejected() {
        assert!(encode_image(b"%PDF-1.7 not an image").is_none());
        assert!(encode_image(&[]).is_none());
    }
}
