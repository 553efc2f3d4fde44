use std::path::Path;

use crate::foundation::error::{CardError, CardResult};
use crate::render::compose;

/// The working image buffer: the template decoded into premultiplied
/// RGBA8, mutated in place across the field loop, then handed back to
/// the caller as the finished card.
///
/// Persistence is the caller's job; convert with [`CardCanvas::into_image`]
/// and save with the `image` crate.
#[derive(Clone, Debug)]
pub struct CardCanvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CardCanvas {
    /// Decode the template image at `path`.
    pub fn open(path: &Path) -> CardResult<Self> {
        let decoded = image::open(path).map_err(|e| {
            CardError::template_load(format!("open template '{}': {e}", path.display()))
        })?;
        Ok(Self::from_image(decoded.to_rgba8()))
    }

    /// Take ownership of a decoded straight-alpha image.
    pub fn from_image(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut data = image.into_raw();
        compose::premultiply_in_place(&mut data);
        Self {
            width,
            height,
            data,
        }
    }

    /// Build from raw straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> CardResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CardError::validation(
                "canvas byte length must be width * height * 4",
            ));
        }
        compose::premultiply_in_place(&mut data);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw premultiplied pixel bytes, row-major.
    pub fn as_premul_rgba8(&self) -> &[u8] {
        &self.data
    }

    /// Convert back to a straight-alpha image for encoding.
    pub fn into_image(self) -> CardResult<image::RgbaImage> {
        let mut data = self.data;
        compose::unpremultiply_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| CardError::validation("canvas buffer does not match its dimensions"))
    }

    /// Composite a full-canvas premultiplied layer over this canvas.
    pub(crate) fn composite_layer(&mut self, premul_src: &[u8]) -> CardResult<()> {
        compose::over_in_place(&mut self.data, premul_src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba8_checks_buffer_length() {
        assert!(CardCanvas::from_rgba8(2, 2, vec![0u8; 15]).is_err());
        assert!(CardCanvas::from_rgba8(2, 2, vec![0u8; 16]).is_ok());
    }

    #[test]
    fn opaque_pixels_round_trip_through_premultiplication() {
        let pixels = vec![200u8, 100, 50, 255, 1, 2, 3, 255];
        let canvas = CardCanvas::from_rgba8(2, 1, pixels.clone()).unwrap();
        let image = canvas.into_image().unwrap();
        assert_eq!(image.into_raw(), pixels);
    }

    #[test]
    fn open_missing_template_is_a_template_load_error() {
        let err = CardCanvas::open(Path::new("/nonexistent/template.png")).unwrap_err();
        assert!(matches!(err, CardError::TemplateLoad(_)));
    }

    #[test]
    fn composite_layer_blends_over_existing_content() {
        let mut canvas = CardCanvas::from_rgba8(1, 1, vec![100, 100, 100, 255]).unwrap();
        // Premultiplied half-transparent red layer.
        canvas.composite_layer(&[128, 0, 0, 128]).unwrap();
        let px = canvas.as_premul_rgba8();
        assert_eq!(px[3], 255);
        assert!(px[0] > 128, "expected blend toward red, got {px:?}");
        assert!(px[1] < 100, "expected darkened green, got {px:?}");
    }
}
