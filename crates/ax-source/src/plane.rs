use std::sync::Arc;

use ax_core::clock::FrameClock;
use ax_core::config::SceneConfig;
use ax_core::frame::FrameBuffer;
use ax_core::traits::Source;
use rayon::prelude::*;

const ANIMATION_SPEED: f32 = 0.322_205;
const COORD_SCALE: f32 = 0.004_599;

/// Plan animé en arrière-plan : champ de couleurs harmonique plein écran.
///
/// Evaluated per pixel on rayon. Every uniform (time, offset) comes from
/// the caller, so a given `(clock, scene)` always yields the same frame.
///
/// # Example
/// ```
/// use ax_core::clock::FrameClock;
/// use ax_core::config::SceneConfig;
/// use ax_core::traits::Source;
/// use ax_source::plane::PlaneSource;
///
/// let mut plane = PlaneSource::new(32, 32, &SceneConfig::default());
/// let frame = plane.next_frame(&FrameClock::default()).unwrap();
/// assert_eq!(frame.width, 32);
/// ```
pub struct PlaneSource {
    width: u32,
    height: u32,
    offset: f32,
    pool: Vec<Arc<FrameBuffer>>,
}

impl PlaneSource {
    /// Creates a generator producing `width × height` frames.
    ///
    /// A zero dimension yields a source that never produces a frame.
    #[must_use]
    pub fn new(width: u32, height: u32, scene: &SceneConfig) -> Self {
        let pool = (0..3)
            .map(|_| Arc::new(FrameBuffer::new(width, height)))
            .collect();
        Self {
            width,
            height,
            offset: scene.offset,
            pool,
        }
    }
}

/// Couleur du plan au pixel `frag` (coordonnées fenêtre, origine en bas à gauche).
#[must_use]
pub fn plane_color(frag: (f32, f32), time: f32, offset: f32) -> [f32; 3] {
    let mut x = frag.0 * COORD_SCALE;
    let mut y = frag.1 * COORD_SCALE;

    let base_phase = (time * 0.008_212_05).cos();
    let fourth_harmonic = time * 1.001_021_1;
    let variance = base_phase + 0.003 * base_phase * (0.0205 * fourth_harmonic);

    for harmonic in 1..3 {
        let h = harmonic as f32;
        x += (1.001 / h) * (variance * 2.2 * y + time * ANIMATION_SPEED).cos() + offset * 0.345;
        y += (3.1 / h) * (h * 62.32 * x + time * ANIMATION_SPEED).floor() * (offset * 0.350) / 23.0;
    }

    let s = x + y;
    [
        (s + 5.0).cos() * 0.42 + 0.3,
        (s + 32.0).cos() * 0.51 + 0.4,
        (s.sin() + (x + x).cos()) * 0.03 + 0.25,
    ]
}

impl Source for PlaneSource {
    fn next_frame(&mut self, clock: &FrameClock) -> Option<Arc<FrameBuffer>> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        // Réutilise un buffer que plus personne ne tient.
        let free_idx = self
            .pool
            .iter()
            .position(|a| Arc::strong_count(a) == 1)?;
        let fb = Arc::get_mut(&mut self.pool[free_idx])?;

        let (time, offset, height) = (clock.time, self.offset, self.height);
        let stride = self.width as usize * 4;

        fb.data
            .par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(row_idx, row)| {
                let frag_y = (height - 1 - row_idx as u32) as f32 + 0.5;
                for (px, out) in row.chunks_exact_mut(4).enumerate() {
                    let [r, g, b] = plane_color((px as f32 + 0.5, frag_y), time, offset);
                    out[0] = to_u8(r);
                    out[1] = to_u8(g);
                    out[2] = to_u8(b);
                    out[3] = 255;
                }
            });

        Some(Arc::clone(&self.pool[free_idx]))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_live(&self) -> bool {
        true
    }

    fn set_scene(&mut self, scene: &SceneConfig) {
        if (scene.offset - self.offset).abs() > f32::EPSILON {
            log::debug!("Plan : offset {} → {}", self.offset, scene.offset);
        }
        self.offset = scene.offset;
    }
}

#[inline(always)]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
