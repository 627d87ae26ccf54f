//! Image loading
//!
//! JPEG files are embedded as they are (`/DCTDecode`), everything else is
//! decoded with the `image` crate into 8-bit samples, with any alpha channel
//! split off into a soft mask. Files stored with one bit per pixel stay at
//! one bit, they can be used as images or as stencil masks.

use std::{fs, io::Cursor, path::Path};

use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageReader};
use log::debug;

use crate::{color::DeviceColorSpace, error::LoadError, id::IccColorSpaceId};

/// Decoded 8-bit samples
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Space of the samples in `data`
    pub color_space: DeviceColorSpace,
    /// Interleaved samples, row by row
    pub data: Vec<u8>,
    /// One alpha sample per pixel
    pub alpha: Option<Vec<u8>>,
    /// Profile to use instead of the device space
    pub icc: Option<IccColorSpaceId>,
}

impl RasterImage {
    /// Check that the sample buffers match the dimensions
    pub fn validate(&self) -> Result<(), LoadError> {
        let pixels = self.width as usize * self.height as usize;
        let expected = pixels * self.color_space.num_components() as usize;
        if self.data.len() != expected {
            return Err(LoadError::InvalidImage(format!(
                "expected {} samples, got {}",
                expected,
                self.data.len()
            )));
        }
        if let Some(alpha) = &self.alpha {
            if alpha.len() != pixels {
                return Err(LoadError::InvalidImage(format!(
                    "expected {} alpha samples, got {}",
                    pixels,
                    alpha.len()
                )));
            }
        }
        Ok(())
    }
}

/// Packed 1-bit samples, each row padded to a whole byte, `0` is black
#[derive(Debug, Clone)]
pub struct MonoImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed rows, most significant bit first
    pub data: Vec<u8>,
}

impl MonoImage {
    /// Threshold 8-bit gray samples
    pub fn from_luma(width: u32, height: u32, luma: &[u8]) -> Self {
        let row_bytes = Self::row_bytes_for(width);
        let mut data = vec![0u8; row_bytes * height as usize];
        if width > 0 {
            for (y, row) in luma.chunks_exact(width as usize).enumerate() {
                let out = &mut data[y * row_bytes..(y + 1) * row_bytes];
                for (x, &v) in row.iter().enumerate() {
                    if v >= 0x80 {
                        out[x / 8] |= 0x80 >> (x % 8);
                    }
                }
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    fn row_bytes_for(width: u32) -> usize {
        (width as usize + 7) / 8
    }

    /// Bytes per packed row
    pub fn row_bytes(&self) -> usize {
        Self::row_bytes_for(self.width)
    }

    /// Check that the packed rows match the dimensions
    pub fn validate(&self) -> Result<(), LoadError> {
        let expected = self.row_bytes() * self.height as usize;
        if self.data.len() != expected {
            return Err(LoadError::InvalidImage(format!(
                "expected {} bytes of 1-bit rows, got {}",
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Frame header of a baseline or progressive JPEG
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct JpegInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bits per sample
    pub bits_per_component: u8,
    /// Device space implied by the number of components
    pub color_space: DeviceColorSpace,
    /// Adobe CMYK JPEGs store inverted samples
    pub inverted: bool,
}

/// An image ready to be added to a document
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// JPEG data to embed without re-encoding
    Jpeg(JpegInfo, Vec<u8>),
    /// Decoded samples
    Raster(RasterImage),
    /// A black and white image
    Mono(MonoImage),
}

/// Read an image file
pub fn load_image(path: &Path) -> Result<ImageSource, LoadError> {
    let data = fs::read(path)?;
    decode_image(data)
}

/// Turn encoded image bytes into an [`ImageSource`]
pub fn decode_image(data: Vec<u8>) -> Result<ImageSource, LoadError> {
    if let Some(info) = jpeg_info(&data) {
        debug!("JPEG {}x{} {:?}", info.width, info.height, info.color_space);
        return Ok(ImageSource::Jpeg(info, data));
    }

    let decoder = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()?
        .into_decoder()?;
    let mono = png_bilevel(&data) || decoder.original_color_type() == ExtendedColorType::L1;
    let img = DynamicImage::from_decoder(decoder)?;
    let (width, height) = (img.width(), img.height());
    if mono {
        debug!("1-bit image {}x{}", width, height);
        let luma = img.into_luma8().into_raw();
        return Ok(ImageSource::Mono(MonoImage::from_luma(width, height, &luma)));
    }
    let color = img.color();
    let gray = !color.has_color();

    let (color_space, data, alpha) = match (gray, color.has_alpha()) {
        (true, false) => (DeviceColorSpace::Gray, img.into_luma8().into_raw(), None),
        (false, false) => (DeviceColorSpace::Rgb, img.into_rgb8().into_raw(), None),
        (true, true) => {
            let raw = img.into_luma_alpha8().into_raw();
            let (samples, alpha) = split_alpha(&raw, 1);
            (DeviceColorSpace::Gray, samples, Some(alpha))
        }
        (false, true) => {
            let raw = img.into_rgba8().into_raw();
            let (samples, alpha) = split_alpha(&raw, 3);
            (DeviceColorSpace::Rgb, samples, Some(alpha))
        }
    };
    Ok(ImageSource::Raster(RasterImage {
        width,
        height,
        color_space,
        data,
        alpha,
        icc: None,
    }))
}

/// A grayscale PNG with one bit per pixel, the decoder expands these to 8 bits
fn png_bilevel(data: &[u8]) -> bool {
    data.starts_with(b"\x89PNG\r\n\x1a\n")
        && data.get(12..16) == Some(b"IHDR".as_slice())
        && data.get(24..26) == Some([1u8, 0].as_slice())
}

fn split_alpha(raw: &[u8], n: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels = raw.len() / (n + 1);
    let mut samples = Vec::with_capacity(pixels * n);
    let mut alpha = Vec::with_capacity(pixels);
    for px in raw.chunks_exact(n + 1) {
        samples.extend_from_slice(&px[..n]);
        alpha.push(px[n]);
    }
    (samples, alpha)
}

/// Find the frame header of a JPEG file
pub fn jpeg_info(data: &[u8]) -> Option<JpegInfo> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut adobe = false;
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let body = data.get(pos + 4..pos + 2 + len)?;
        match marker {
            0xEE if body.starts_with(b"Adobe") => adobe = true,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                if body.len() < 6 {
                    return None;
                }
                let color_space = match body[5] {
                    1 => DeviceColorSpace::Gray,
                    3 => DeviceColorSpace::Rgb,
                    4 => DeviceColorSpace::Cmyk,
                    _ => return None,
                };
                return Some(JpegInfo {
                    bits_per_component: body[0],
                    height: u16::from_be_bytes([body[1], body[2]]).into(),
                    width: u16::from_be_bytes([body[3], body[4]]).into(),
                    color_space,
                    inverted: adobe && color_space == DeviceColorSpace::Cmyk,
                });
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }
        pos += 2 + len;
    }
    None
}
