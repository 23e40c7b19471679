//! Scene container: an insertion-ordered collection of scene objects

use log::warn;

use crate::gfx::assets::{Assets, MeshHandle};
use crate::gfx::camera::Camera;
use crate::gfx::mesh::DrawMesh;

use super::object::SceneObject;

/// Holds the objects to draw each frame.
///
/// Object order is insertion order and doubles as draw order; depth testing
/// resolves overlap, there is no explicit sort. Removal by index shifts
/// later objects down, so indices held across a removal go stale.
#[derive(Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new object with identity transform, opaque white tint, and
    /// `active = true`, returning it for further configuration.
    pub fn add(&mut self, mesh: MeshHandle, name: &str) -> &mut SceneObject {
        self.objects.push(SceneObject::new(mesh, name));
        self.objects.last_mut().unwrap()
    }

    /// Removes the object at `index`. Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) {
        if index < self.objects.len() {
            self.objects.remove(index);
        } else {
            warn!("scene remove index {} out of range ({})", index, self.objects.len());
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneObject> {
        self.objects.iter()
    }

    /// Object names in draw order, for UI listings
    pub fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name.clone()).collect()
    }

    /// Creates missing per-object GPU resources. Call after [`Assets::upload`]
    /// so texture bind groups can see uploaded texture views.
    pub fn ensure_gpu_resources(&mut self, device: &wgpu::Device, assets: &Assets) {
        for object in self.objects.iter_mut() {
            object.ensure_gpu_resources(device, assets);
        }
    }

    /// Writes per-object uniforms (MVP, model, tint, material scalars) for
    /// every active object.
    pub fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        for object in self.objects.iter_mut() {
            if object.active {
                object.update_uniform(queue, camera);
            }
        }
    }

    /// Records draw calls for every active object into an open render pass.
    ///
    /// The caller binds the pipeline and the global bind group (slot 0); this
    /// method owns slots 1 (object uniform) and 2 (texture). Objects without
    /// a texture bind `fallback_texture` so a previous object's texture can
    /// never bleed into the draw. Mutates shared pass state; render-thread
    /// only.
    pub fn render<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        assets: &'a Assets,
        fallback_texture: &'a wgpu::BindGroup,
    ) {
        for object in self.objects.iter() {
            if !object.active {
                continue;
            }
            let Some(mesh) = assets.mesh(object.mesh) else {
                continue;
            };
            let Some(gpu) = object.gpu.as_ref() else {
                continue;
            };

            render_pass.set_bind_group(1, &gpu.uniform_bind_group, &[]);
            render_pass.set_bind_group(
                2,
                gpu.texture_bind_group.as_ref().unwrap_or(fallback_texture),
                &[],
            );
            render_pass.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::mesh::Mesh;
    use cgmath::{Matrix4, Vector3, Vector4};

    fn scene_with(n: usize) -> (Scene, Assets) {
        let mut assets = Assets::new();
        let cube = assets.add_mesh(Mesh::cube());
        let mut scene = Scene::new();
        for i in 0..n {
            scene.add(cube, &format!("object {}", i));
        }
        (scene, assets)
    }

    #[test]
    fn add_appends_with_defaults() {
        let (mut scene, mut assets) = scene_with(0);
        let cube = assets.add_mesh(Mesh::cube());
        let object = scene.add(cube, "crate");
        assert_eq!(object.color, [1.0, 1.0, 1.0, 1.0]);
        assert!(object.active);
        assert_eq!(object.transform, crate::gfx::transform::Transform::default());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn remove_shifts_later_objects_down() {
        let (mut scene, _assets) = scene_with(4);
        scene.remove(1);
        assert_eq!(scene.len(), 3);
        let names = scene.object_names();
        assert_eq!(names, vec!["object 0", "object 2", "object 3"]);
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let (mut scene, _assets) = scene_with(3);
        scene.remove(3);
        scene.remove(100);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn clear_empties_the_scene() {
        let (mut scene, _assets) = scene_with(5);
        scene.clear();
        assert!(scene.is_empty());
    }

    #[test]
    fn cube_at_origin_lands_inside_camera_depth_range() {
        // Camera at (0, 6, -15) pitched to look at the origin; the cube's
        // origin must land between the near and far planes in view space.
        let (mut scene, mut assets) = scene_with(0);
        let cube = assets.add_mesh(Mesh::cube());
        let object = scene.add(cube, "cube");
        object.color = [0.9, 0.5, 0.3, 1.0];

        let mut camera = crate::gfx::camera::Camera::new(45.0, 16.0 / 9.0, 0.1, 100.0);
        camera.set_position(Vector3::new(0.0, 6.0, -15.0));
        let to_origin = Vector3::<f32>::new(0.0, -6.0, 15.0);
        let distance = (to_origin.x * to_origin.x
            + to_origin.y * to_origin.y
            + to_origin.z * to_origin.z)
            .sqrt();
        let pitch = (to_origin.y / distance).asin();
        camera.set_rotation(pitch, 0.0);

        let object = scene.get(0).unwrap();
        let model: Matrix4<f32> = object.transform.model_matrix();
        let view_space = camera.view_matrix() * model * Vector4::new(0.0, 0.0, 0.0, 1.0);

        // Right-handed view space looks down -Z
        let depth = -view_space.z;
        assert!(depth > camera.near_plane());
        assert!(depth < camera.far_plane());
        assert!((depth - distance).abs() < 1e-3);
    }

    #[test]
    fn object_uniform_composes_mvp_from_camera_and_transform() {
        let (mut scene, mut assets) = scene_with(0);
        let cube = assets.add_mesh(Mesh::cube());
        let object = scene.add(cube, "cube");
        object.transform.position = Vector3::new(2.0, 0.0, 1.0);

        let camera = crate::gfx::camera::Camera::default();
        let uniform = scene.get(0).unwrap().uniform(&camera);

        let expected: Matrix4<f32> = camera.view_projection_matrix()
            * scene.get(0).unwrap().transform.model_matrix();
        let expected: [[f32; 4]; 4] = expected.into();
        for col in 0..4 {
            for row in 0..4 {
                assert!((uniform.mvp[col][row] - expected[col][row]).abs() < 1e-5);
            }
        }
    }
}
