use std::path::Path;
use tracing::debug;

/// Multiplier applied per zoom step
const ZOOM_STEP: f32 = 1.25;
const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 8.0;

/// Zoom factor for the image preview (1.0 = 100%)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom { factor: 1.0 }
    }
}

impl Zoom {
    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn zoom_in(&mut self) {
        self.factor = (self.factor * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.factor = (self.factor / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Display size of an image with pixel size `(width, height)`
    pub fn scale(&self, (width, height): (u32, u32)) -> (f32, f32) {
        (width as f32 * self.factor, height as f32 * self.factor)
    }

    /// Percentage label (e.g. "125%")
    pub fn percent(&self) -> String {
        format!("{:.0}%", self.factor * 100.0)
    }
}

/// Read the pixel size from the image header, `None` if the file is not a readable image
pub fn image_size(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(size) => Some(size),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read image size");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_zoom_steps_and_reset() {
        let mut zoom = Zoom::default();
        zoom.zoom_in();
        assert_eq!(zoom.factor(), 1.25);
        assert_eq!(zoom.percent(), "125%");

        zoom.zoom_out();
        zoom.zoom_out();
        assert_eq!(zoom.factor(), 0.8);

        zoom.reset();
        assert_eq!(zoom, Zoom::default());
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut zoom = Zoom::default();
        for _ in 0..50 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.factor(), MAX_ZOOM);

        for _ in 0..100 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.factor(), MIN_ZOOM);
    }

    #[test]
    fn test_scale() {
        let mut zoom = Zoom::default();
        assert_eq!(zoom.scale((640, 480)), (640.0, 480.0));
        zoom.zoom_in();
        assert_eq!(zoom.scale((400, 200)), (500.0, 250.0));
    }

    #[test]
    fn test_image_size_reads_png_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tiny.png");
        image::RgbImage::new(3, 2).save(&path).unwrap();

        assert_eq!(image_size(&path), Some((3, 2)));
    }

    #[test]
    fn test_image_size_of_non_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fake.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        assert_eq!(image_size(&path), None);
    }
}
