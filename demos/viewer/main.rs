//! Model viewer demo: loads a glTF model if given on the command line,
//! otherwise builds a small scene from the mesh factories.

use anyhow::Result;
use brume::prelude::*;

struct ViewerLayer {
    model_path: Option<String>,
    selected: Option<usize>,
    orbit_angle: f32,
}

impl Layer for ViewerLayer {
    fn on_create(&mut self, ctx: &mut EngineContext) {
        ctx.camera.set_position(Vector3::new(0.0, 3.0, -8.0));
        ctx.camera.set_rotation(-0.3, 0.0);

        if let Some(path) = self.model_path.clone() {
            match Model::load(&path, ctx.assets) {
                Ok(model) => {
                    for (i, &mesh) in model.mesh_handles().iter().enumerate() {
                        let material = model.material_for_mesh(i);
                        let object = ctx.scene.add(mesh, &format!("{} [{}]", model.name(), i));
                        object.color = material.base_color;
                        object.roughness = material.roughness;
                        object.metallic = material.metallic;
                        object.texture = material.base_color_texture;
                    }
                }
                Err(e) => log::error!("could not load {}: {}", path, e),
            }
        } else {
            let cube = ctx.assets.add_mesh(Mesh::cube());
            let plane = ctx.assets.add_mesh(Mesh::plane(10.0));
            let pyramid = ctx.assets.add_mesh(Mesh::pyramid());

            ctx.scene.add(plane, "Floor").transform.position.y = -0.5;

            let object = ctx.scene.add(cube, "Cube");
            object.color = [0.9, 0.5, 0.3, 1.0];
            object.roughness = 0.35;

            let object = ctx.scene.add(pyramid, "Pyramid");
            object.transform.position = Vector3::new(2.5, -0.5, 0.0);
            object.color = [0.4, 0.7, 0.9, 1.0];
        }
    }

    fn on_update(&mut self, dt: f32, ctx: &mut EngineContext) {
        // Slow turntable on the first non-floor object
        self.orbit_angle += dt * 0.5;
        if let Some(object) = ctx.scene.get_mut(1) {
            object.transform.rotation.y = self.orbit_angle;
        }
    }

    fn on_event(&mut self, event: &Event, ctx: &mut EngineContext) {
        match event {
            Event::Key {
                key: KeyCode::KeyQ,
                pressed: true,
                ..
            } => ctx.request_quit(),
            Event::MouseScrolled { dy, .. } => {
                ctx.camera.move_forward(*dy * 0.5);
            }
            _ => {}
        }
    }

    fn on_ui(&mut self, ui: &Ui, scene: &mut Scene, assets: &mut Assets) {
        scene_panel(ui, scene, assets, &mut self.selected);
    }
}

fn main() -> Result<()> {
    let model_path = std::env::args().nth(1);

    let mut app = BrumeApp::new(EngineConfig {
        title: "Brume Viewer".to_string(),
        width: 1280,
        height: 800,
        vsync: true,
    });
    app.set_layer(ViewerLayer {
        model_path,
        selected: None,
        orbit_angle: 0.0,
    });
    app.run();
    Ok(())
}
