// src/material.rs
// Material records and their interleaved GPU packing.
// This file exists to pack per-material scalars and map indices into the channel layout the shader indexes.
// RELEVANT FILES:src/lights.rs,src/pipeline/kernels.rs,src/pipeline/mod.rs

use glam::{Vec2, Vec3};

/// Index value meaning "no texture bound for this slot"
pub const NO_MAP: i32 = -1;

/// Shading workflow selector for a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    MetalnessRoughness,
    SpecularGlossiness,
}

/// One material as the integration kernel understands it
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub emissive: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub normal_scale: Vec2,
    pub alpha: f32,
    pub specular_tint: f32,
    pub sheen: f32,
    pub sheen_tint: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub subsurface: f32,
    pub transmission: f32,
    pub ior: f32,
    pub at_distance: f32,
    pub anisotropic: f32,
    pub workflow: Workflow,
    pub extinction: Vec3,
    pub specular_color: Vec3,
    pub glossiness: f32,
    pub diffuse_map_index: i32,
    pub normal_map_index: i32,
    pub roughness_map_index: i32,
    pub metalness_map_index: i32,
    pub emissive_map_index: i32,
    pub specular_map_index: i32,
    pub glossiness_map_index: i32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::splat(0.8),
            emissive: Vec3::ZERO,
            roughness: 0.5,
            metalness: 0.0,
            normal_scale: Vec2::ONE,
            alpha: 1.0,
            specular_tint: 0.0,
            sheen: 0.0,
            sheen_tint: 0.5,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            subsurface: 0.0,
            transmission: 0.0,
            ior: 1.5,
            at_distance: 1.0,
            anisotropic: 0.0,
            workflow: Workflow::MetalnessRoughness,
            extinction: Vec3::ONE,
            specular_color: Vec3::ONE,
            glossiness: 1.0,
            diffuse_map_index: NO_MAP,
            normal_map_index: NO_MAP,
            roughness_map_index: NO_MAP,
            metalness_map_index: NO_MAP,
            emissive_map_index: NO_MAP,
            specular_map_index: NO_MAP,
            glossiness_map_index: NO_MAP,
        }
    }
}

/// Interleaved material streams, four channels per material per row, in the
/// order the shader's struct layout expects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialBuffer {
    pub count: u32,
    pub color_and_type: Vec<f32>,
    pub roughness_metalness_normal_scale: Vec<f32>,
    pub alpha_specular_tint_sheen_sheen_tint: Vec<f32>,
    pub clearcoat_roughness_subsurface_transmission: Vec<f32>,
    pub ior_at_distance_anisotropic_workflow: Vec<f32>,
    pub specular_color_glossiness: Vec<f32>,
    pub extinction: Vec<f32>,
    pub diffuse_normal_roughness_metalness_map_index: Vec<i32>,
    pub emissive_specular_glossiness_map_index: Vec<i32>,
}

impl MaterialBuffer {
    pub fn pack(materials: &[Material]) -> Self {
        let mut buffer = MaterialBuffer {
            count: materials.len() as u32,
            ..Default::default()
        };

        for m in materials {
            let workflow = match m.workflow {
                Workflow::MetalnessRoughness => 0.0,
                Workflow::SpecularGlossiness => 1.0,
            };

            buffer.color_and_type.extend_from_slice(&[
                m.color.x, m.color.y, m.color.z, 0.0,
            ]);
            buffer.roughness_metalness_normal_scale.extend_from_slice(&[
                m.roughness,
                m.metalness,
                m.normal_scale.x,
                m.normal_scale.y,
            ]);
            buffer
                .alpha_specular_tint_sheen_sheen_tint
                .extend_from_slice(&[m.alpha, m.specular_tint, m.sheen, m.sheen_tint]);
            buffer
                .clearcoat_roughness_subsurface_transmission
                .extend_from_slice(&[
                    m.clearcoat,
                    m.clearcoat_roughness,
                    m.subsurface,
                    m.transmission,
                ]);
            buffer
                .ior_at_distance_anisotropic_workflow
                .extend_from_slice(&[m.ior, m.at_distance, m.anisotropic, workflow]);
            buffer.specular_color_glossiness.extend_from_slice(&[
                m.specular_color.x,
                m.specular_color.y,
                m.specular_color.z,
                m.glossiness,
            ]);
            buffer.extinction.extend_from_slice(&[
                m.extinction.x,
                m.extinction.y,
                m.extinction.z,
                m.anisotropic,
            ]);
            buffer
                .diffuse_normal_roughness_metalness_map_index
                .extend_from_slice(&[
                    m.diffuse_map_index,
                    m.normal_map_index,
                    m.roughness_map_index,
                    m.metalness_map_index,
                ]);
            // The fourth channel repeats the emissive index; shaders read the
            // duplicate, so the layout is kept as-is.
            // TODO: decide whether the last channel should carry a distinct
            // second emissive/SG index and migrate the shader side with it.
            buffer
                .emissive_specular_glossiness_map_index
                .extend_from_slice(&[
                    m.emissive_map_index,
                    m.specular_map_index,
                    m.glossiness_map_index,
                    m.emissive_map_index,
                ]);
        }

        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_channels_per_material_per_stream() {
        let buffer = MaterialBuffer::pack(&[Material::default(), Material::default()]);
        assert_eq!(buffer.count, 2);
        assert_eq!(buffer.color_and_type.len(), 8);
        assert_eq!(buffer.roughness_metalness_normal_scale.len(), 8);
        assert_eq!(buffer.ior_at_distance_anisotropic_workflow.len(), 8);
        assert_eq!(buffer.emissive_specular_glossiness_map_index.len(), 8);
    }

    #[test]
    fn emissive_index_occupies_first_and_last_channel() {
        let material = Material {
            emissive_map_index: 7,
            specular_map_index: 2,
            glossiness_map_index: 3,
            ..Default::default()
        };
        let buffer = MaterialBuffer::pack(&[material]);
        assert_eq!(
            buffer.emissive_specular_glossiness_map_index,
            vec![7, 2, 3, 7]
        );
    }

    #[test]
    fn workflow_flag_lands_in_fourth_channel() {
        let material = Material {
            workflow: Workflow::SpecularGlossiness,
            ..Default::default()
        };
        let buffer = MaterialBuffer::pack(&[material]);
        assert_eq!(buffer.ior_at_distance_anisotropic_workflow[3], 1.0);
    }
}
