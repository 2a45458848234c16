//! The pixel buffers a scene is rendered into.

use crate::Rgba;

/// A render target with color, depth and entity-id planes.
///
/// Depth is normalized clip-space depth in `[0, 1]`; the id plane holds the
/// opaque entity identifier that last wrote each pixel, which is what
/// picking reads back.
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    background: Rgba,
    color: Vec<Rgba>,
    depth: Vec<f64>,
    id: Vec<Option<u64>>,
}

impl Frame {
    /// A cleared frame of the given pixel dimensions.
    pub fn new(width: usize, height: usize, background: Rgba) -> Frame {
        Frame {
            width,
            height,
            background,
            color: vec![background; width * height],
            depth: vec![1.0; width * height],
            id: vec![None; width * height],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset every pixel to the background, full depth and no entity.
    pub fn clear(&mut self) {
        self.color.fill(self.background);
        self.depth.fill(1.0);
        self.id.fill(None);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// The color at a pixel.
    pub fn color_at(&self, x: usize, y: usize) -> Rgba {
        self.color[self.index(x, y)]
    }

    /// The normalized depth at a pixel; 1.0 where nothing was drawn.
    pub fn depth_at(&self, x: usize, y: usize) -> f64 {
        self.depth[self.index(x, y)]
    }

    /// The entity id at a pixel, if any face wrote it.
    pub fn id_at(&self, x: usize, y: usize) -> Option<u64> {
        self.id[self.index(x, y)]
    }

    /// The color plane in row-major order, for blitting.
    pub fn pixels(&self) -> &[Rgba] {
        &self.color
    }

    /// Write one pixel, blending translucent colors over what is already
    /// there. Depth and id are overwritten even for translucent writes, so
    /// the pixel picks as the nearest face regardless of opacity.
    pub(crate) fn set_pixel(&mut self, x: usize, y: usize, depth: f64, color: Rgba, id: u64) {
        let i = self.index(x, y);
        self.color[i] = color.over(self.color[i]);
        self.depth[i] = depth;
        self.id[i] = Some(id);
    }

    /// Overwrite a pixel's color only, leaving depth and id alone.
    pub(crate) fn paint_over(&mut self, x: usize, y: usize, color: Rgba) {
        let i = self.index(x, y);
        self.color[i] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_cleared() {
        let bg = Rgba::opaque(0, 0, 0);
        let frame = Frame::new(4, 3, bg);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(frame.color_at(x, y), bg);
                assert_eq!(frame.depth_at(x, y), 1.0);
                assert_eq!(frame.id_at(x, y), None);
            }
        }
    }

    #[test]
    fn test_set_pixel_then_clear() {
        let bg = Rgba::opaque(10, 10, 10);
        let mut frame = Frame::new(2, 2, bg);
        frame.set_pixel(1, 0, 0.25, Rgba::opaque(200, 0, 0), 7);
        assert_eq!(frame.id_at(1, 0), Some(7));
        assert_eq!(frame.depth_at(1, 0), 0.25);
        frame.clear();
        assert_eq!(frame.id_at(1, 0), None);
        assert_eq!(frame.color_at(1, 0), bg);
    }

    #[test]
    fn test_translucent_write_overwrites_depth_and_id() {
        let mut frame = Frame::new(2, 2, Rgba::opaque(0, 0, 0));
        frame.set_pixel(0, 0, 0.5, Rgba::new(50, 200, 100, 100), 3);
        assert_eq!(frame.id_at(0, 0), Some(3));
        assert_eq!(frame.depth_at(0, 0), 0.5);
        assert_eq!(frame.color_at(0, 0).a, 255);
    }
}
