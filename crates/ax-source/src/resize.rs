use anyhow::{Context, Result};
use ax_core::frame::{FrameBuffer, Resolution};
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer as FirResizer};

/// Resizer réutilisable wrappant fast_image_resize.
///
/// Brings every source frame to the output resolution before the ASCII pass.
///
/// # Example
/// ```
/// use ax_source::resize::Resizer;
/// use ax_core::frame::{FrameBuffer, Resolution};
/// let mut r = Resizer::new();
/// let out = r.resize_to(&FrameBuffer::new(100, 100), Resolution::new(50, 25)).unwrap();
/// assert_eq!((out.width, out.height), (50, 25));
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// fast_image_resize exige `&mut` sur la source.
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a resizer with default (convolution) options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new(),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. The dimensions of `dst` set the output size.
    ///
    /// # Errors
    /// Returns an error if either buffer has a zero dimension.
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        anyhow::ensure!(
            src.width > 0 && src.height > 0 && dst.width > 0 && dst.height > 0,
            "Redimensionnement impossible : {}x{} → {}x{}",
            src.width,
            src.height,
            dst.width,
            dst.height
        );
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Dimensions source invalides")?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Redimensionnement échoué")?;
        Ok(())
    }

    /// Allocating form of [`Resizer::resize_into`].
    ///
    /// # Errors
    /// Returns an error if the resize operation fails.
    pub fn resize_to(&mut self, src: &FrameBuffer, target: Resolution) -> Result<FrameBuffer> {
        if src.resolution() == target {
            return Ok(src.clone());
        }
        let mut dst = FrameBuffer::new(target.width, target.height);
        self.resize_into(src, &mut dst)?;
        Ok(dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_is_a_copy() {
        let src = FrameBuffer::filled(4, 3, [9, 8, 7, 6]);
        let out = Resizer::new().resize_to(&src, Resolution::new(4, 3)).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn uniform_color_survives_scaling() {
        let src = FrameBuffer::filled(64, 32, [200, 100, 50, 255]);
        let mut resizer = Resizer::new();
        for target in [Resolution::new(16, 16), Resolution::new(128, 80)] {
            let out = resizer.resize_to(&src, target).unwrap();
            assert_eq!(out.resolution(), target);
            for px in out.data.chunks_exact(4) {
                assert!(px[0].abs_diff(200) <= 1, "{px:?}");
                assert!(px[1].abs_diff(100) <= 1, "{px:?}");
                assert!(px[2].abs_diff(50) <= 1, "{px:?}");
                assert!(px[3] >= 254, "{px:?}");
            }
        }
    }

    #[test]
    fn zero_target_is_an_error() {
        let src = FrameBuffer::filled(8, 8, [0, 0, 0, 255]);
        assert!(Resizer::new().resize_to(&src, Resolution::new(0, 4)).is_err());
    }
}
