// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! External image storage.
//!
//! The canvas exchanges pixels with the outside world as unpremultiplied
//! sRGB RGBA8 bytes with a caller-supplied stride. [`ImageData`] is the
//! owned, tightly-packed form of that layout, convenient for
//! [`put_image_data`](crate::Canvas::put_image_data),
//! [`draw_image`](crate::Canvas::draw_image), and
//! [`set_pattern`](crate::Canvas::set_pattern).

/// An owned RGBA8 image: unpremultiplied sRGB, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct ImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageData {
    /// Create a transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap existing RGBA8 bytes.
    ///
    /// `data` must hold exactly `width * height * 4` bytes.
    ///
    /// # Panics
    ///
    /// Panics if the byte count does not match the dimensions.
    pub fn from_parts(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * 4,
            "expected `data` to hold exactly `width * height` RGBA8 pixels"
        );
        Self {
            width,
            height,
            data,
        }
    }

    /// Decode a PNG into image data.
    #[cfg(feature = "png")]
    pub fn from_png(data: impl std::io::Read) -> Result<Self, png::DecodingError> {
        let mut decoder = png::Decoder::new(data);
        decoder.set_transformations(
            png::Transformations::normalize_to_color8() | png::Transformations::ALPHA,
        );
        let mut reader = decoder.read_info()?;
        let (width, height) = {
            let info = reader.info();
            (info.width, info.height)
        };
        let mut image = Self::new(width, height);
        let (color_type, _) = reader.output_color_type();
        match color_type {
            png::ColorType::Rgba => {
                reader.next_frame(&mut image.data)?;
            }
            png::ColorType::GrayscaleAlpha => {
                let mut gray = vec![0; reader.output_buffer_size()];
                reader.next_frame(&mut gray)?;
                for (source, target) in gray.chunks_exact(2).zip(image.data.chunks_exact_mut(4)) {
                    target[0] = source[0];
                    target[1] = source[0];
                    target[2] = source[0];
                    target[3] = source[1];
                }
            }
            // The transformations requested above always yield an
            // alpha-carrying 8-bit format.
            _ => unreachable!("normalize_to_color8 + ALPHA yields RGBA or gray-alpha"),
        }
        Ok(image)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes; rows are tightly packed.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// The pixel bytes, row-major RGBA8.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
