//! Raster image decoding backed by the `image` crate.

use image::{ImageError, RgbaImage};
use std::collections::HashMap;
use vectra_core::resources::{DecodeError, DecodedImage, ImageDecoder, ImageHandle};

/// Decodes PNG, JPEG and WebP buffers and keeps their RGBA8 pixels, keyed
/// by the handle given to the shape.
#[derive(Debug, Default)]
pub struct RasterImageDecoder {
    next_handle: u64,
    images: HashMap<ImageHandle, RgbaImage>,
}

impl RasterImageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixels behind a handle.
    pub fn pixels(&self, handle: ImageHandle) -> Option<&RgbaImage> {
        self.images.get(&handle)
    }

    /// Drop the pixels behind a handle.
    pub fn release(&mut self, handle: ImageHandle) -> bool {
        self.images.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageDecoder for RasterImageDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| match e {
                ImageError::Unsupported(_) => DecodeError::UnsupportedFormat,
                other => DecodeError::Corrupt(other.to_string()),
            })?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty);
        }

        self.next_handle += 1;
        let handle = ImageHandle(self.next_handle);
        self.images.insert(handle, rgba);
        log::debug!("Decoded {width}x{height} image as {handle:?}");
        Ok(DecodedImage { width, height, handle })
    }
}
