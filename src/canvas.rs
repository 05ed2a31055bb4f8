use crate::{
    core::FrameRGBA,
    error::ForgeResult,
    filter::apply_filter,
    media::MediaElement,
    model::EffectSettings,
};

/// Drawing surface the preview paints into and the recorder captures from.
#[derive(Clone, Debug, Default)]
pub struct Canvas2d {
    pixels: FrameRGBA,
}

impl Canvas2d {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }

    /// Sizes the surface to the source picture. Resizing clears it.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.pixels.width != width || self.pixels.height != height {
            self.pixels = FrameRGBA::new(width, height);
        }
    }

    /// One render tick. The surface always follows the source size; a frame is
    /// only painted while playing, otherwise the previous contents stay.
    /// Returns whether anything was drawn.
    pub fn render_tick(
        &mut self,
        media: &mut dyn MediaElement,
        effects: &EffectSettings,
        playing: bool,
    ) -> ForgeResult<bool> {
        let (w, h) = media.video_size();
        self.resize(w, h);
        if !playing || w == 0 || h == 0 {
            return Ok(false);
        }
        let frame = media.current_frame()?;
        self.draw_filtered(&frame, effects)?;
        Ok(true)
    }

    /// Draws `frame` scaled to the surface through the effect chain.
    pub fn draw_filtered(&mut self, frame: &FrameRGBA, effects: &EffectSettings) -> ForgeResult<()> {
        let fitted = if frame.width == self.pixels.width && frame.height == self.pixels.height {
            frame.clone()
        } else {
            scale_nearest(frame, self.pixels.width, self.pixels.height)
        };
        self.pixels = apply_filter(&fitted, effects)?;
        Ok(())
    }

    /// Snapshot of what a stream capture would see right now.
    pub fn capture_frame(&self) -> FrameRGBA {
        self.pixels.clone()
    }
}

fn scale_nearest(src: &FrameRGBA, width: u32, height: u32) -> FrameRGBA {
    let mut out = FrameRGBA::new(width, height);
    if src.width == 0 || src.height == 0 {
        return out;
    }
    for y in 0..height {
        let sy = (u64::from(y) * u64::from(src.height) / u64::from(height.max(1))) as u32;
        for x in 0..width {
            let sx = (u64::from(x) * u64::from(src.width) / u64::from(width.max(1))) as u32;
            if let Some(px) = src.pixel(sx, sy) {
                let idx = ((y as usize) * (width as usize) + x as usize) * 4;
                out.data[idx..idx + 4].copy_from_slice(&px);
            }
        }
    }
    out
}
