use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ax_core::clock::FrameClock;
use ax_core::frame::FrameBuffer;
use ax_core::traits::Source;

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use ax_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("photo.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
}

impl ImageSource {
    /// Load an image from disk and wrap it as a source.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn new(path: &Path) -> Result<Self> {
        let frame = load_image(path)?;
        log::info!(
            "Image chargée : {} ({}x{})",
            path.display(),
            frame.width,
            frame.height
        );
        Ok(Self {
            frame: Arc::new(frame),
        })
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self, _clock: &FrameClock) -> Option<Arc<FrameBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Decode any supported file (png, jpeg, bmp, gif) into an RGBA frame.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    FrameBuffer::from_raw(w, h, rgba.into_raw())
        .with_context(|| format!("Image vide : {}", path.display()))
}
