//! CPU rendition of the CSS filter chain
//! `brightness(b%) contrast(c%) saturate(s%) blur(px)` over RGBA8 frames.

use rayon::prelude::*;

use crate::{
    blur_cpu::blur_frame,
    core::FrameRGBA,
    error::{ForgeError, ForgeResult},
    model::EffectSettings,
};

// Rec.709 luma weights used by the CSS/SVG saturate matrix.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Per-pixel part of the chain, resolved to plain multipliers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorOps {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl ColorOps {
    pub fn from_settings(settings: &EffectSettings) -> ForgeResult<Self> {
        let ops = Self {
            brightness: percent(settings.brightness, "brightness")?,
            contrast: percent(settings.contrast, "contrast")?,
            saturation: percent(settings.saturation, "saturation")?,
        };
        Ok(ops)
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.saturation == 1.0
    }

    fn apply_px(&self, px: &mut [u8]) {
        let mut r = f32::from(px[0]) / 255.0;
        let mut g = f32::from(px[1]) / 255.0;
        let mut b = f32::from(px[2]) / 255.0;

        if self.brightness != 1.0 {
            r = clamp01(r * self.brightness);
            g = clamp01(g * self.brightness);
            b = clamp01(b * self.brightness);
        }

        if self.contrast != 1.0 {
            r = clamp01((r - 0.5) * self.contrast + 0.5);
            g = clamp01((g - 0.5) * self.contrast + 0.5);
            b = clamp01((b - 0.5) * self.contrast + 0.5);
        }

        if self.saturation != 1.0 {
            let s = self.saturation;
            (r, g, b) = (
                (LUMA_R + (1.0 - LUMA_R) * s) * r
                    + (LUMA_G - LUMA_G * s) * g
                    + (LUMA_B - LUMA_B * s) * b,
                (LUMA_R - LUMA_R * s) * r
                    + (LUMA_G + (1.0 - LUMA_G) * s) * g
                    + (LUMA_B - LUMA_B * s) * b,
                (LUMA_R - LUMA_R * s) * r
                    + (LUMA_G - LUMA_G * s) * g
                    + (LUMA_B + (1.0 - LUMA_B) * s) * b,
            );
        }

        px[0] = to_u8(r);
        px[1] = to_u8(g);
        px[2] = to_u8(b);
    }
}

/// Applies the full chain. Alpha is carried through untouched by the color
/// steps; blur runs last over all four channels.
#[tracing::instrument(level = "trace", skip(frame), fields(w = frame.width, h = frame.height))]
pub fn apply_filter(frame: &FrameRGBA, settings: &EffectSettings) -> ForgeResult<FrameRGBA> {
    let ops = ColorOps::from_settings(settings)?;
    if !settings.blur.is_finite() || settings.blur < 0.0 {
        return Err(ForgeError::validation(format!(
            "blur must be finite and >= 0, got {}",
            settings.blur
        )));
    }

    let mut out = frame.clone();
    if !ops.is_identity() {
        out.data
            .par_chunks_mut(4)
            .for_each(|px| ops.apply_px(px));
    }

    if settings.blur > 0.0 {
        out = blur_frame(&out, settings.blur as f32)?;
    }
    Ok(out)
}

fn percent(v: f64, name: &str) -> ForgeResult<f32> {
    if !v.is_finite() || v < 0.0 {
        return Err(ForgeError::validation(format!(
            "{name} must be finite and >= 0, got {v}"
        )));
    }
    Ok((v / 100.0) as f32)
}

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

fn to_u8(v: f32) -> u8 {
    (clamp01(v) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> FrameRGBA {
        let mut f = FrameRGBA::new(w, h);
        for (i, px) in f.data.chunks_exact_mut(4).enumerate() {
            let v = (i * 37 % 256) as u8;
            px.copy_from_slice(&[v, 255 - v, v / 2, 255]);
        }
        f
    }

    #[test]
    fn neutral_settings_are_identity() {
        let src = gradient(8, 4);
        let out = apply_filter(&src, &EffectSettings::default()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn zero_brightness_is_black_with_alpha_kept() {
        let src = FrameRGBA::filled(2, 2, [200, 100, 50, 180]);
        let fx = EffectSettings {
            brightness: 0.0,
            ..EffectSettings::default()
        };
        let out = apply_filter(&src, &fx).unwrap();
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 180]));
    }

    #[test]
    fn zero_contrast_is_mid_gray() {
        let src = gradient(3, 3);
        let fx = EffectSettings {
            contrast: 0.0,
            ..EffectSettings::default()
        };
        let out = apply_filter(&src, &fx).unwrap();
        for px in out.data.chunks_exact(4) {
            assert_eq!(&px[..3], &[128, 128, 128]);
        }
    }

    #[test]
    fn zero_saturation_is_grayscale() {
        let src = FrameRGBA::filled(1, 1, [255, 0, 0, 255]);
        let fx = EffectSettings {
            saturation: 0.0,
            ..EffectSettings::default()
        };
        let out = apply_filter(&src, &fx).unwrap();
        let px = out.pixel(0, 0).unwrap();
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[0], (LUMA_R * 255.0).round() as u8);
    }

    #[test]
    fn double_brightness_saturates_highlights() {
        let src = FrameRGBA::filled(1, 1, [200, 60, 0, 255]);
        let fx = EffectSettings {
            brightness: 200.0,
            ..EffectSettings::default()
        };
        let out = apply_filter(&src, &fx).unwrap();
        assert_eq!(out.pixel(0, 0), Some([255, 120, 0, 255]));
    }

    #[test]
    fn blur_keeps_dimensions() {
        let src = gradient(16, 9);
        let fx = EffectSettings {
            blur: 2.0,
            ..EffectSettings::default()
        };
        let out = apply_filter(&src, &fx).unwrap();
        assert_eq!((out.width, out.height), (16, 9));
        assert_ne!(out, src);
    }

    #[test]
    fn very_large_blur_still_renders() {
        let src = gradient(32, 24);
        let fx = EffectSettings {
            blur: 1e9,
            ..EffectSettings::default()
        };
        let out = apply_filter(&src, &fx).unwrap();
        assert_eq!((out.width, out.height), (32, 24));
    }

    #[test]
    fn rejects_negative_values() {
        let src = gradient(2, 2);
        let fx = EffectSettings {
            contrast: -1.0,
            ..EffectSettings::default()
        };
        assert!(apply_filter(&src, &fx).is_err());
    }
}
