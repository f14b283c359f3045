//! Rasterizes the night hemisphere into an RGBA buffer.
//!
//! The renderer walks the viewport on a coarse grid, inverse-projects the
//! top-left pixel of every cell and paints the whole cell either fully
//! transparent (day) or a translucent black (night). The result is a
//! stride-quantized staircase along the terminator; there is no
//! anti-aliasing.

use crate::illumination::is_daylight;
use crate::solar::SubsolarPoint;

/// Default sampling interval in screen pixels.
pub const DEFAULT_STRIDE: u32 = 2;

/// Default night alpha (about 35% opacity).
pub const DEFAULT_NIGHT_ALPHA: u8 = 90;

/// Host-owned screen-space projection, read once per render pass.
pub trait Viewport {
    /// Pixel dimensions. Hosts may report zero or negative sizes while a
    /// window is minimized; those renders are skipped.
    fn size(&self) -> (i32, i32);

    /// Inverse projection from a pixel inside `[0, width) × [0, height)` to
    /// `(latitude, longitude)` in degrees.
    fn pixel_to_geo(&self, x: u32, y: u32) -> (f64, f64);
}

/// Host drawing surface, lent to the renderer for a single call.
pub trait OverlaySurface {
    /// Copy a finished buffer onto the surface.
    fn blit(&mut self, buffer: &RasterBuffer);

    /// Drop whatever the surface holds for this overlay.
    fn release(&mut self);
}

/// Width × height RGBA8 pixels, row-major, top-left origin.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2], self.data[idx + 3]]
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Fill `w × h` pixels starting at `(x, y)` with black at `alpha`.
    /// The caller guarantees the block lies inside the buffer.
    fn fill_block(&mut self, x: u32, y: u32, w: u32, h: u32, alpha: u8) {
        let row_bytes = self.width as usize * 4;
        for row in y..y + h {
            let start = row as usize * row_bytes + x as usize * 4;
            let end = start + w as usize * 4;
            for px in self.data[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&[0, 0, 0, alpha]);
            }
        }
    }
}

/// Sampling density and night wash opacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskStyle {
    stride: u32,
    night_alpha: u8,
}

impl MaskStyle {
    /// A stride of zero is treated as one.
    pub fn new(stride: u32, night_alpha: u8) -> Self {
        Self {
            stride: stride.max(1),
            night_alpha,
        }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn night_alpha(&self) -> u8 {
        self.night_alpha
    }
}

impl Default for MaskStyle {
    fn default() -> Self {
        Self::new(DEFAULT_STRIDE, DEFAULT_NIGHT_ALPHA)
    }
}

/// Counters from one completed render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub width: u32,
    pub height: u32,
    /// Number of inverse projections performed.
    pub samples: u32,
    /// How many of those samples were classified as night.
    pub night_samples: u32,
}

/// Owns the raster buffer between renders.
#[derive(Debug, Default)]
pub struct MaskRenderer {
    style: MaskStyle,
    buffer: Option<RasterBuffer>,
}

impl MaskRenderer {
    pub fn new(style: MaskStyle) -> Self {
        Self { style, buffer: None }
    }

    /// The buffer produced by the last successful render.
    pub fn buffer(&self) -> Option<&RasterBuffer> {
        self.buffer.as_ref()
    }

    /// Drop the buffer; the next render allocates afresh.
    pub fn release(&mut self) {
        self.buffer = None;
    }

    /// Render the night mask for `viewport` and blit it onto `surface`.
    ///
    /// Returns `None` without touching the projection or the surface when
    /// the viewport has no area.
    pub fn render<V, S>(
        &mut self,
        viewport: &V,
        subsolar: &SubsolarPoint,
        surface: &mut S,
    ) -> Option<RenderStats>
    where
        V: Viewport + ?Sized,
        S: OverlaySurface + ?Sized,
    {
        let (w, h) = viewport.size();
        if w <= 0 || h <= 0 {
            return None;
        }
        let (width, height) = (w as u32, h as u32);

        let buffer = match self.buffer.take() {
            Some(mut buf) if buf.width == width && buf.height == height => {
                buf.clear();
                buf
            }
            _ => RasterBuffer::transparent(width, height),
        };
        let buffer = self.buffer.insert(buffer);

        let stride = self.style.stride;
        let mut stats = RenderStats {
            width,
            height,
            ..Default::default()
        };

        for y in (0..height).step_by(stride as usize) {
            let block_h = stride.min(height - y);
            for x in (0..width).step_by(stride as usize) {
                let (lat, lon) = viewport.pixel_to_geo(x, y);
                stats.samples += 1;
                if is_daylight(lat, lon, subsolar) {
                    continue;
                }
                stats.night_samples += 1;
                let block_w = stride.min(width - x);
                buffer.fill_block(x, y, block_w, block_h, self.style.night_alpha);
            }
        }

        surface.blit(buffer);
        Some(stats)
    }
}
