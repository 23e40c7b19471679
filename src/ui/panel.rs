// src/ui/panel.rs
//! Default scene editing panel
//!
//! Object list with selection, transform and material controls for the
//! selected object, plus add/delete buttons backed by the mesh factories.

use crate::gfx::assets::Assets;
use crate::gfx::mesh::Mesh;
use crate::gfx::scene::Scene;
use cgmath::Vector3;

/// Draws the scene panel: object list, per-object controls, and factory
/// buttons for adding primitive shapes.
pub fn scene_panel(
    ui: &imgui::Ui,
    scene: &mut Scene,
    assets: &mut Assets,
    selected_index: &mut Option<usize>,
) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }
    let panel_width = (display_size[0] * 0.25).clamp(320.0, 450.0);
    let panel_height = (display_size[1] * 0.8).max(480.0);

    ui.window("Scene")
        .size([panel_width, panel_height], imgui::Condition::FirstUseEver)
        .position([16.0, 16.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_add_buttons(ui, scene, assets);
            ui.separator();
            render_object_list(ui, scene, selected_index);
            ui.separator();
            render_object_controls(ui, scene, selected_index);
        });
}

fn render_add_buttons(ui: &imgui::Ui, scene: &mut Scene, assets: &mut Assets) {
    if ui.button("Add Cube") {
        let mesh = assets.add_mesh(Mesh::cube());
        let name = format!("Cube {}", scene.len());
        scene.add(mesh, &name);
    }
    ui.same_line();
    if ui.button("Add Pyramid") {
        let mesh = assets.add_mesh(Mesh::pyramid());
        let name = format!("Pyramid {}", scene.len());
        scene.add(mesh, &name);
    }
    ui.same_line();
    if ui.button("Add Plane") {
        let mesh = assets.add_mesh(Mesh::plane(4.0));
        let name = format!("Plane {}", scene.len());
        scene.add(mesh, &name);
    }
}

fn render_object_list(ui: &imgui::Ui, scene: &mut Scene, selected_index: &mut Option<usize>) {
    ui.text(format!("Objects ({})", scene.len()));
    ui.spacing();

    if scene.is_empty() {
        ui.text_disabled("No objects - add one above");
        return;
    }

    let names = scene.object_names();
    ui.child_window("object_list")
        .size([0.0, 140.0])
        .border(true)
        .build(|| {
            for (i, name) in names.iter().enumerate() {
                let is_selected = *selected_index == Some(i);
                if ui
                    .selectable_config(format!("{}##{}", name, i))
                    .selected(is_selected)
                    .build()
                {
                    *selected_index = Some(i);
                }
            }
        });
}

fn render_object_controls(ui: &imgui::Ui, scene: &mut Scene, selected_index: &mut Option<usize>) {
    let Some(index) = *selected_index else {
        return;
    };

    // Deletion shifts later indices down, so drop the selection afterwards
    let mut delete_requested = false;

    if let Some(object) = scene.get_mut(index) {
        ui.text(format!("Selected: {}", object.name));
        ui.spacing();

        if ui.collapsing_header("Transform", imgui::TreeNodeFlags::DEFAULT_OPEN) {
            let mut position = [
                object.transform.position.x,
                object.transform.position.y,
                object.transform.position.z,
            ];
            if imgui::Drag::new("Position")
                .speed(0.05)
                .build_array(ui, &mut position)
            {
                object.transform.position = Vector3::from(position);
            }

            let degrees = object.transform.rotation_degrees();
            let mut rotation = [degrees.x, degrees.y, degrees.z];
            if imgui::Drag::new("Rotation")
                .speed(1.0)
                .build_array(ui, &mut rotation)
            {
                object
                    .transform
                    .set_rotation_degrees(Vector3::from(rotation));
            }

            let mut scale = [
                object.transform.scale.x,
                object.transform.scale.y,
                object.transform.scale.z,
            ];
            if imgui::Drag::new("Scale")
                .speed(0.02)
                .range(0.01, 100.0)
                .build_array(ui, &mut scale)
            {
                object.transform.scale = Vector3::from(scale);
            }
        }

        if ui.collapsing_header("Material", imgui::TreeNodeFlags::DEFAULT_OPEN) {
            ui.color_edit4("Tint", &mut object.color);
            ui.slider("Roughness", 0.0, 1.0, &mut object.roughness);
            ui.slider("Metallic", 0.0, 1.0, &mut object.metallic);
        }

        ui.spacing();
        ui.checkbox("Active", &mut object.active);
        ui.spacing();

        if ui.button("Delete") {
            delete_requested = true;
        }
    }

    if delete_requested {
        scene.remove(index);
        *selected_index = None;
    }
}
