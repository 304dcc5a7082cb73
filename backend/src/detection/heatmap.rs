use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

use super::HeatmapBuffer;

#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),
    #[error("buffer holds {actual} bytes, expected {expected} for {width}x{height}x{channels}")]
    SizeMismatch {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },
    #[error("overlay dimensions {width}x{height}x{channels} overflow the address space")]
    Oversized { width: u32, height: u32, channels: u8 },
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl HeatmapBuffer {
    fn to_image(&self) -> Result<DynamicImage, HeatmapError> {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(self.channels as usize))
            .ok_or(HeatmapError::Oversized {
                width: self.width,
                height: self.height,
                channels: self.channels,
            })?;
        let mismatch = || HeatmapError::SizeMismatch {
            width: self.width,
            height: self.height,
            channels: self.channels,
            expected,
            actual: self.pixels.len(),
        };
        if self.pixels.len() != expected {
            return Err(mismatch());
        }

        let image = match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, self.pixels.clone())
                .map(DynamicImage::ImageLuma8),
            3 => {
                let rgb = self
                    .pixels
                    .chunks_exact(3)
                    .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
                    .collect();
                RgbImage::from_raw(self.width, self.height, rgb).map(DynamicImage::ImageRgb8)
            }
            4 => {
                let rgba = self
                    .pixels
                    .chunks_exact(4)
                    .flat_map(|bgra| [bgra[2], bgra[1], bgra[0], bgra[3]])
                    .collect();
                RgbaImage::from_raw(self.width, self.height, rgba).map(DynamicImage::ImageRgba8)
            }
            other => return Err(HeatmapError::UnsupportedChannels(other)),
        };
        image.ok_or_else(mismatch)
    }
}

/// Encodes the overlay losslessly as PNG and returns it base64-encoded.
pub fn encode_png_base64(buffer: &HeatmapBuffer) -> Result<String, HeatmapError> {
    let image = buffer.to_image()?;
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(STANDARD.encode(png))
}
