use crate::color::Rgba;
use crate::error::CoreError;

/// Buffer de pixels réutilisable. Pré-alloué, jamais redimensionné en hot path.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel, ligne du haut
/// en premier.
///
/// # Example
/// ```
/// use ax_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Output resolution in pixels, passed explicitly to every pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Build a resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Normalized coordinate of the center of pixel `(x, y)`.
    ///
    /// `y` counts rows from the top; the returned `v` grows upward, so row 0
    /// maps to the top edge of UV space.
    ///
    /// # Example
    /// ```
    /// use ax_core::frame::Resolution;
    /// let res = Resolution::new(4, 2);
    /// assert_eq!(res.pixel_center_uv(0, 0), [0.125, 0.75]);
    /// assert_eq!(res.pixel_center_uv(3, 1), [0.875, 0.25]);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel_center_uv(&self, x: u32, y: u32) -> [f32; 2] {
        [
            (x as f32 + 0.5) / self.width as f32,
            1.0 - (y as f32 + 0.5) / self.height as f32,
        ]
    }
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué aux dimensions données, transparent.
    ///
    /// # Example
    /// ```
    /// use ax_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap existing RGBA bytes.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimensions` if a dimension is zero or the
    /// byte count does not match `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer rempli d'une seule couleur.
    ///
    /// # Example
    /// ```
    /// use ax_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, [255, 0, 0, 255]);
    /// assert_eq!(fb.pixel(1, 1), (255, 0, 0, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Dimensions as a `Resolution`.
    #[inline]
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Example
    /// ```
    /// use ax_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// let (r, g, b, a) = fb.pixel(0, 0);
    /// assert_eq!((r, g, b, a), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Écrit le pixel (x, y). Ignoré hors limites.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx..idx + 4].copy_from_slice(&rgba);
    }

    /// Bilinear, clamp-to-edge view of this buffer.
    #[must_use]
    pub fn sampler(&self) -> BilinearSampler<'_> {
        BilinearSampler { frame: self }
    }

    #[inline(always)]
    fn texel(&self, x: u32, y: u32) -> Rgba {
        let (r, g, b, a) = self.pixel(x, y);
        Rgba::from_u8([r, g, b, a])
    }
}

/// Read accessor over an image, addressable at arbitrary normalized
/// coordinates (`(0,0)` bottom-left, `(1,1)` top-right).
///
/// Implementations must be safe to call from many threads at once.
pub trait Sampler: Sync {
    /// Filtered color at `uv`.
    fn sample(&self, uv: [f32; 2]) -> Rgba;
}

/// Filtrage bilinéaire sur les centres de texels, adressage clamp-to-edge.
///
/// Sampling exactly at a texel center returns that texel.
///
/// # Example
/// ```
/// use ax_core::frame::{FrameBuffer, Sampler};
/// let fb = FrameBuffer::filled(4, 4, [255, 255, 255, 255]);
/// let c = fb.sampler().sample([0.3, 0.7]);
/// assert_eq!(c.r, 1.0);
/// ```
#[derive(Clone, Copy)]
pub struct BilinearSampler<'a> {
    frame: &'a FrameBuffer,
}

impl Sampler for BilinearSampler<'_> {
    #[inline]
    fn sample(&self, uv: [f32; 2]) -> Rgba {
        let fb = self.frame;
        if fb.width == 0 || fb.height == 0 {
            return Rgba::default();
        }

        let tx = uv[0] * fb.width as f32 - 0.5;
        // Rows counted bottom-up in texture space.
        let ty = uv[1] * fb.height as f32 - 0.5;
        let x0f = tx.floor();
        let y0f = ty.floor();
        let fx = tx - x0f;
        let fy = ty - y0f;

        let max_x = fb.width as i64 - 1;
        let max_y = fb.height as i64 - 1;
        let clamp_x = |x: i64| x.clamp(0, max_x) as u32;
        let row = |y: i64| (max_y - y.clamp(0, max_y)) as u32;

        let (x0, y0) = (x0f as i64, y0f as i64);
        let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1));
        let (ra, rb) = (row(y0), row(y0 + 1));

        let bottom = fb.texel(xa, ra).lerp(fb.texel(xb, ra), fx);
        let top = fb.texel(xa, rb).lerp(fb.texel(xb, rb), fx);
        bottom.lerp(top, fy)
    }
}
