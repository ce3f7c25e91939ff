use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use hotswap::UniformSet;

use super::camera::OrbitCamera;

/// Mirrors the `SpectraScene` std140 block injected ahead of every user stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub time: f32,
    pub pointer_speed: f32,
    pub pointer: [f32; 2],
}

pub(crate) const SCENE_UNIFORMS_SIZE: u64 = std::mem::size_of::<SceneUniforms>() as u64;

impl SceneUniforms {
    pub fn compose(camera: &OrbitCamera, aspect: f32, model: Mat4, values: &UniformSet) -> Self {
        let view = camera.view();
        let model_view = view * model;
        let normal = model_view.inverse().transpose();
        let eye: Vec3 = camera.eye();
        Self {
            projection: camera.projection(aspect).to_cols_array_2d(),
            model_view: model_view.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            camera_position: eye.extend(1.0).to_array(),
            time: values.time,
            pointer_speed: values.pointer_speed,
            pointer: values.pointer_position,
        }
    }
}

/// Model transform for the active mesh: spin about the up (Z) axis.
pub(crate) fn model_matrix(rotation: f32, scale: f32) -> Mat4 {
    Mat4::from_rotation_z(rotation) * Mat4::from_scale(Vec3::splat(scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        // Five mat4 (320) + vec4 (16) + two floats (8) + vec2 (8).
        assert_eq!(SCENE_UNIFORMS_SIZE, 352);
        assert_eq!(std::mem::offset_of!(SceneUniforms, camera_position), 320);
        assert_eq!(std::mem::offset_of!(SceneUniforms, time), 336);
        assert_eq!(std::mem::offset_of!(SceneUniforms, pointer), 344);
    }

    #[test]
    fn compose_copies_frame_values() {
        let camera = OrbitCamera::default();
        let values = UniformSet {
            time: 2.5,
            pointer_position: [0.25, 0.75],
            pointer_speed: 0.1,
        };
        let uniforms = SceneUniforms::compose(&camera, 1.5, model_matrix(0.0, 1.0), &values);

        assert_eq!(uniforms.time, 2.5);
        assert_eq!(uniforms.pointer, [0.25, 0.75]);
        assert_eq!(uniforms.model, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(uniforms.model_view, uniforms.view);
        assert_eq!(uniforms.camera_position[3], 1.0);
    }
}
