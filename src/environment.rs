// src/environment.rs
// Environment lighting input: decode to linear RGB float or fall back to a flat background color.
// This file exists to normalize the supported encodings and keep unrecognized ones non-fatal.
// RELEVANT FILES:src/error.rs,src/pipeline/kernels.rs,src/pipeline/mod.rs

use glam::Vec3;
use log::warn;

use crate::error::{RenderError, RenderResult};

/// Raw environment payload as supplied by the host
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentData {
    /// Shared-exponent RGBE, four bytes per texel
    Rgbe8(Vec<u8>),
    /// Linear float RGBA, four floats per texel
    RgbaF32(Vec<f32>),
    /// Linear float RGB, three floats per texel
    RgbF32(Vec<f32>),
    /// An encoding this renderer does not decode (e.g. half-float payloads)
    Unsupported(String),
}

/// Environment map description handed to `prepare`
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pub intensity: f32,
    pub data: EnvironmentData,
}

/// What the integration kernel ends up sampling
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// Equirectangular linear RGB texels
    Texture {
        width: u32,
        height: u32,
        texels: Vec<f32>,
    },
    /// Flat background color
    Constant(Vec3),
}

impl EnvironmentMap {
    /// Decode into tightly packed linear RGB. Unsupported encodings are a
    /// typed error here; `prepare_or_fallback` is what the pipeline calls.
    pub fn prepare(&self) -> RenderResult<Environment> {
        let texel_count = (self.width * self.height) as usize;
        match &self.data {
            EnvironmentData::Rgbe8(bytes) => {
                if bytes.len() < texel_count * 4 {
                    return Err(RenderError::UnsupportedEnvironmentFormat(format!(
                        "RGBE payload holds {} bytes, needs {}",
                        bytes.len(),
                        texel_count * 4
                    )));
                }
                let mut texels = Vec::with_capacity(texel_count * 3);
                for px in bytes.chunks_exact(4).take(texel_count) {
                    let [r, g, b] = rgbe_to_linear(px[0], px[1], px[2], px[3]);
                    texels.push(r * self.intensity);
                    texels.push(g * self.intensity);
                    texels.push(b * self.intensity);
                }
                Ok(Environment::Texture {
                    width: self.width,
                    height: self.height,
                    texels,
                })
            }
            EnvironmentData::RgbaF32(floats) => {
                if floats.len() < texel_count * 4 {
                    return Err(RenderError::UnsupportedEnvironmentFormat(format!(
                        "RGBA float payload holds {} values, needs {}",
                        floats.len(),
                        texel_count * 4
                    )));
                }
                let mut texels = Vec::with_capacity(texel_count * 3);
                for px in floats.chunks_exact(4).take(texel_count) {
                    texels.push(px[0] * self.intensity);
                    texels.push(px[1] * self.intensity);
                    texels.push(px[2] * self.intensity);
                }
                Ok(Environment::Texture {
                    width: self.width,
                    height: self.height,
                    texels,
                })
            }
            EnvironmentData::RgbF32(floats) => {
                if floats.len() < texel_count * 3 {
                    return Err(RenderError::UnsupportedEnvironmentFormat(format!(
                        "RGB float payload holds {} values, needs {}",
                        floats.len(),
                        texel_count * 3
                    )));
                }
                let texels = floats
                    .iter()
                    .take(texel_count * 3)
                    .map(|v| v * self.intensity)
                    .collect();
                Ok(Environment::Texture {
                    width: self.width,
                    height: self.height,
                    texels,
                })
            }
            EnvironmentData::Unsupported(kind) => Err(
                RenderError::UnsupportedEnvironmentFormat(kind.clone()),
            ),
        }
    }

    /// Decode, recovering from unrecognized encodings with a flat background
    /// color so the frame loop never aborts over lighting input
    pub fn prepare_or_fallback(&self, background: Vec3) -> Environment {
        match self.prepare() {
            Ok(environment) => environment,
            Err(e) => {
                warn!("environment map rejected ({e}); falling back to flat background");
                Environment::Constant(background)
            }
        }
    }
}

/// Shared-exponent RGBE decode
#[inline]
fn rgbe_to_linear(r: u8, g: u8, b: u8, e: u8) -> [f32; 3] {
    if e == 0 {
        return [0.0; 3];
    }
    let scale = (2.0f32).powi(e as i32 - 128) / 255.0;
    [r as f32 * scale, g as f32 * scale, b as f32 * scale]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgbe_decodes_to_linear() {
        // exponent 128 => scale 1/255
        let map = EnvironmentMap {
            width: 1,
            height: 1,
            intensity: 1.0,
            data: EnvironmentData::Rgbe8(vec![255, 0, 51, 128]),
        };
        match map.prepare().unwrap() {
            Environment::Texture { texels, .. } => {
                assert!((texels[0] - 1.0).abs() < 1e-6);
                assert_eq!(texels[1], 0.0);
                assert!((texels[2] - 0.2).abs() < 1e-6);
            }
            other => panic!("expected texture environment, got {other:?}"),
        }
    }

    #[test]
    fn rgba_drops_alpha_and_applies_intensity() {
        let map = EnvironmentMap {
            width: 2,
            height: 1,
            intensity: 2.0,
            data: EnvironmentData::RgbaF32(vec![
                1.0, 0.5, 0.25, 1.0, //
                0.1, 0.2, 0.3, 0.0,
            ]),
        };
        match map.prepare().unwrap() {
            Environment::Texture { texels, .. } => {
                assert_eq!(texels.len(), 6);
                assert_eq!(texels[0], 2.0);
                assert_eq!(texels[5], 0.6);
            }
            other => panic!("expected texture environment, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_encoding_is_typed() {
        let map = EnvironmentMap {
            width: 4,
            height: 4,
            intensity: 1.0,
            data: EnvironmentData::Unsupported("half-float".into()),
        };
        assert!(matches!(
            map.prepare(),
            Err(RenderError::UnsupportedEnvironmentFormat(_))
        ));
    }

    #[test]
    fn fallback_recovers_with_flat_color() {
        let map = EnvironmentMap {
            width: 4,
            height: 4,
            intensity: 1.0,
            data: EnvironmentData::Unsupported("half-float".into()),
        };
        let env = map.prepare_or_fallback(Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(env, Environment::Constant(Vec3::new(0.1, 0.2, 0.3)));
    }
}
