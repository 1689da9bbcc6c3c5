use crate::bindings::{ColorField, FieldBinding, ScaleXField, format_hex, parse_hex};
use cubeview_frame::RenderSignal;
use cubeview_scene::{Color, Scene};
use tracing::warn;

const SCALE_X_MIN: f32 = 0.1;
const SCALE_X_MAX: f32 = 1.5;

/// One collapsible group of widgets per cube.
struct CubeBindings {
    label: String,
    color: ColorField,
    scale_x: ScaleXField,
    /// In-progress text of the hex field. Re-synced from the scene whenever
    /// the field is not being edited.
    hex_draft: String,
}

impl CubeBindings {
    fn show(&mut self, ui: &mut egui::Ui, scene: &mut Scene, signal: &RenderSignal) {
        egui::CollapsingHeader::new(self.label.clone())
            .default_open(true)
            .show(ui, |ui| {
                self.color_row(ui, scene, signal);
                self.scale_row(ui, scene, signal);
            });
    }

    fn color_row(&mut self, ui: &mut egui::Ui, scene: &mut Scene, signal: &RenderSignal) {
        let Some(current) = self.color.read(scene) else {
            return;
        };

        ui.horizontal(|ui| {
            ui.label("color");

            let mut rgb = current.to_srgb_u8();
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                let picked = Color::from_srgb_u8(rgb[0], rgb[1], rgb[2]);
                if picked != current && self.color.write(scene, picked).is_ok() {
                    signal.notify();
                }
            }

            let response =
                ui.add(egui::TextEdit::singleline(&mut self.hex_draft).desired_width(72.0));
            if response.lost_focus() {
                self.commit_hex(scene, signal);
            } else if !response.has_focus() {
                // Keep the text in step with the swatch while idle.
                if let Some(color) = self.color.read(scene) {
                    self.hex_draft = format_hex(color);
                }
            }
        });
    }

    fn scale_row(&mut self, ui: &mut egui::Ui, scene: &mut Scene, signal: &RenderSignal) {
        let Some(current) = self.scale_x.read(scene) else {
            return;
        };

        let mut value = current;
        let response = ui.add(egui::Slider::new(&mut value, self.scale_x.range()).text("scale x"));
        if response.changed() && value != current && self.scale_x.write(scene, value).is_ok() {
            signal.notify();
        }
    }

    /// Apply the hex draft to the scene. Malformed input is rejected and the
    /// draft snaps back to the scene's actual color.
    fn commit_hex(&mut self, scene: &mut Scene, signal: &RenderSignal) {
        match parse_hex(&self.hex_draft) {
            Ok(color) => {
                if self.color.read(scene) != Some(color) && self.color.write(scene, color).is_ok() {
                    signal.notify();
                }
            }
            Err(err) => {
                warn!(cube = self.color.cube, %err, "color edit rejected");
            }
        }
        if let Some(color) = self.color.read(scene) {
            self.hex_draft = format_hex(color);
        }
    }
}

/// The viewer's side panel: per-cube color and X-scale editors.
///
/// Built once against the scene's fixed cube list; every widget reads its
/// value fresh each frame and writes back through its binding, notifying the
/// render signal on each actual change.
pub struct ScenePanel {
    signal: RenderSignal,
    cubes: Vec<CubeBindings>,
}

impl ScenePanel {
    pub fn new(scene: &Scene, signal: RenderSignal) -> Self {
        let cubes = scene
            .cubes()
            .iter()
            .enumerate()
            .map(|(index, cube)| CubeBindings {
                label: cube.label.clone(),
                color: ColorField { cube: index },
                scale_x: ScaleXField {
                    cube: index,
                    min: SCALE_X_MIN,
                    max: SCALE_X_MAX,
                },
                hex_draft: format_hex(cube.material.color),
            })
            .collect();
        Self { signal, cubes }
    }

    pub fn show(&mut self, ctx: &egui::Context, scene: &mut Scene) {
        egui::SidePanel::left("scene_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Scene");
                ui.separator();
                for group in &mut self.cubes {
                    group.show(ui, scene, &self.signal);
                }
                ui.separator();
                ui.small("LMB drag: orbit | RMB drag: pan | wheel: zoom");
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeview_frame::{Deferral, FramePipeline, RenderScheduler};

    struct NullDeferral;

    impl Deferral for NullDeferral {
        fn schedule(&self) {}
    }

    struct NullPipeline;

    impl FramePipeline for NullPipeline {
        fn sync_viewport(&mut self) {}
        fn advance_camera(&mut self) -> bool {
            false
        }
        fn draw(&mut self) {}
    }

    fn rig() -> (ScenePanel, Scene, RenderScheduler<NullDeferral>) {
        let scene = Scene::demo();
        let scheduler = RenderScheduler::new(NullDeferral);
        let panel = ScenePanel::new(&scene, scheduler.signal());
        (panel, scene, scheduler)
    }

    #[test]
    fn panel_builds_one_group_per_cube() {
        let (panel, scene, _) = rig();
        assert_eq!(panel.cubes.len(), scene.cube_count());
        assert_eq!(panel.cubes[0].label, "Center Cube");
        assert_eq!(panel.cubes[1].hex_draft, "#8844aa");
    }

    #[test]
    fn committing_valid_hex_updates_scene_and_requests_render() {
        let (mut panel, mut scene, mut scheduler) = rig();
        let signal = scheduler.signal();

        panel.cubes[0].hex_draft = "#123456".to_owned();
        panel.cubes[0].commit_hex(&mut scene, &signal);

        assert_eq!(
            scene.cube(0).unwrap().material.color.to_srgb_u8(),
            [0x12, 0x34, 0x56]
        );
        assert_eq!(panel.cubes[0].hex_draft, "#123456");

        scheduler.run_frame(&mut NullPipeline);
        assert!(scheduler.render_pending());
    }

    #[test]
    fn committing_invalid_hex_changes_nothing() {
        let (mut panel, mut scene, mut scheduler) = rig();
        let signal = scheduler.signal();
        let before = scene.cube(1).unwrap().material.color;

        panel.cubes[1].hex_draft = "#nothex".to_owned();
        panel.cubes[1].commit_hex(&mut scene, &signal);

        assert_eq!(scene.cube(1).unwrap().material.color, before);
        // The draft snaps back to the real value.
        assert_eq!(panel.cubes[1].hex_draft, "#8844aa");

        scheduler.run_frame(&mut NullPipeline);
        assert!(!scheduler.render_pending());
    }

    #[test]
    fn committing_the_current_value_does_not_request_render() {
        let (mut panel, mut scene, mut scheduler) = rig();
        let signal = scheduler.signal();

        panel.cubes[1].hex_draft = "#8844aa".to_owned();
        panel.cubes[1].commit_hex(&mut scene, &signal);

        scheduler.run_frame(&mut NullPipeline);
        assert!(!scheduler.render_pending());
    }

    #[test]
    fn edits_within_one_frame_coalesce() {
        let (mut panel, mut scene, mut scheduler) = rig();
        let signal = scheduler.signal();

        panel.cubes[0].hex_draft = "#101010".to_owned();
        panel.cubes[0].commit_hex(&mut scene, &signal);
        panel.cubes[1].hex_draft = "#202020".to_owned();
        panel.cubes[1].commit_hex(&mut scene, &signal);

        // Both notifications drain into a single pending frame.
        scheduler.run_frame(&mut NullPipeline);
        assert!(scheduler.render_pending());
        scheduler.run_frame(&mut NullPipeline);
        assert!(!scheduler.render_pending());
    }

    #[test]
    fn headless_panel_pass_syncs_drafts() {
        let (mut panel, mut scene, _sched) = rig();

        // Change a color behind the panel's back, then run one UI pass.
        scene.cube_mut(2).unwrap().material.color = Color::from_hex_rgb(0xabcdef);
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            panel.show(ctx, &mut scene);
        });

        assert_eq!(panel.cubes[2].hex_draft, "#abcdef");
    }
}
