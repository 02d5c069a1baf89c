//! 2D drawing surface
//!
//! The visualizer draws through [`Canvas2d`], which carries just the
//! rectangle operations it needs. [`RasterCanvas`] is an in-memory RGB
//! implementation that clips to its bounds and can be dumped as a PPM image.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Spectrum background
pub const BACKGROUND: Rgb = Rgb::new(0x1a, 0x1a, 0x1a);

/// Convert CSS-style HSL to RGB
///
/// `hue` is in degrees (wrapped into 0..360), `saturation` and `lightness`
/// in [0, 1].
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(360.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let sector = h / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = l - chroma / 2.0;

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
}

/// Rectangle drawing surface
pub trait Canvas2d {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset a region to transparent
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    /// Fill a region with a color; parts outside the surface are clipped
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb);
}

/// In-memory RGB raster
///
/// Cleared pixels read back as black. A rectangle covers every pixel it
/// touches, so sub-pixel bars still leave a mark.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
    fill_calls: usize,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::default(); width as usize * height as usize],
            fill_calls: 0,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Number of `fill_rect` calls so far
    pub fn fill_calls(&self) -> usize {
        self.fill_calls
    }

    /// Count pixels of exactly this color
    pub fn count_color(&self, color: Rgb) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// Encode as a binary PPM (P6)
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        out.reserve(self.pixels.len() * 3);
        for p in &self.pixels {
            out.extend_from_slice(&[p.r, p.g, p.b]);
        }
        out
    }

    pub fn write_ppm(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_ppm())?;
        Ok(())
    }

    /// Pixel span covered by `[start, start + len)`, clipped to `limit`
    fn span(start: f64, len: f64, limit: u32) -> std::ops::Range<usize> {
        let (lo, hi) = if len < 0.0 {
            (start + len, start)
        } else {
            (start, start + len)
        };
        let lo = lo.floor().max(0.0).min(limit as f64) as usize;
        let hi = hi.ceil().max(0.0).min(limit as f64) as usize;
        lo..hi.max(lo)
    }

    fn paint(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let cols = Self::span(x, w, self.width);
        let rows = Self::span(y, h, self.height);
        let stride = self.width as usize;
        for row in rows {
            let line = &mut self.pixels[row * stride..(row + 1) * stride];
            line[cols.clone()].fill(color);
        }
    }
}

impl Canvas2d for RasterCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.paint(x, y, w, h, Rgb::default());
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        self.fill_calls += 1;
        self.paint(x, y, w, h, color);
    }
}
