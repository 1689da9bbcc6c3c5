use crate::camera::OrbitCamera;
use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Keep the camera off the poles so the view direction never becomes
/// parallel to the up axis.
const MAX_PITCH: f32 = FRAC_PI_2 - 0.001;

/// Squared-distance threshold below which a camera update is considered
/// settled and stops reporting motion.
const CHANGE_EPS: f32 = 1e-6;

/// Per-step dolly factor; one wheel notch scales the orbit radius by
/// `0.95^zoom_speed` (or its inverse).
const ZOOM_BASE: f32 = 0.95;

/// Tuning for [`OrbitController`].
#[derive(Debug, Clone, Copy)]
pub struct OrbitConfig {
    /// Point the camera orbits and keeps looking at.
    pub target: Vec3,
    /// When set, pointer input feeds an inertia that bleeds off over several
    /// frames instead of applying instantly.
    pub damping_enabled: bool,
    /// Fraction of the accumulated input applied per update while damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            damping_enabled: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_radius: 0.1,
            max_radius: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

/// Pointer-driven orbit control with inertial damping.
///
/// Input events accumulate into yaw/pitch/pan deltas and a dolly scale;
/// `update` applies them to the camera. With damping enabled, each update
/// applies `damping_factor` of the remaining rotation and pan, then decays
/// the remainder, so a drag coasts to a stop over several frames. Dolly is
/// exempt: each wheel step applies in full on the next update.
///
/// `update` returns true while the camera is still moving by more than a
/// settling threshold. Callers re-render for as long as it does.
pub struct OrbitController {
    config: OrbitConfig,
    drag: Option<DragMode>,
    cursor: Vec2,
    viewport_height: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    pan_offset: Vec3,
    scale: f32,
    last_position: Vec3,
}

impl OrbitController {
    /// Aim `camera` at the configured target and adopt its current position
    /// as the settled baseline, so a controller with no input reports no
    /// motion.
    pub fn new(config: OrbitConfig, camera: &mut OrbitCamera) -> Self {
        camera.target = config.target;
        Self {
            config,
            drag: None,
            cursor: Vec2::ZERO,
            viewport_height: 1.0,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            last_position: camera.position(),
        }
    }

    /// Drag-to-pixel scaling uses the viewport height; keep it current
    /// across resizes.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    pub fn begin_rotate(&mut self) {
        self.drag = Some(DragMode::Rotate);
    }

    pub fn begin_pan(&mut self) {
        self.drag = Some(DragMode::Pan);
    }

    /// Ends any active drag. Accumulated inertia keeps bleeding off through
    /// subsequent updates.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Track the pointer. While a drag is active the motion since the last
    /// position accumulates into the pending rotation or pan.
    pub fn pointer_moved(&mut self, cursor: Vec2, camera: &OrbitCamera) {
        let delta = cursor - self.cursor;
        match self.drag {
            Some(DragMode::Rotate) => {
                // Both axes scale by viewport height: a full-height drag is
                // one full turn.
                let step = TAU * self.config.rotate_speed / self.viewport_height;
                self.yaw_delta -= delta.x * step;
                self.pitch_delta += delta.y * step;
            }
            Some(DragMode::Pan) => self.accumulate_pan(delta * self.config.pan_speed, camera),
            None => {}
        }
        self.cursor = cursor;
    }

    /// One wheel notch of dolly. Positive steps move toward the target.
    pub fn zoom_steps(&mut self, steps: f32) {
        let factor = ZOOM_BASE.powf(self.config.zoom_speed);
        if steps > 0.0 {
            self.scale *= factor;
        } else if steps < 0.0 {
            self.scale /= factor;
        }
    }

    /// Apply pending input to `camera`. Returns true if the camera moved
    /// beyond the settling threshold since the previous update.
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        let applied = if self.config.damping_enabled {
            self.config.damping_factor
        } else {
            1.0
        };

        camera.yaw += self.yaw_delta * applied;
        camera.pitch = (camera.pitch + self.pitch_delta * applied).clamp(-MAX_PITCH, MAX_PITCH);
        camera.radius =
            (camera.radius * self.scale).clamp(self.config.min_radius, self.config.max_radius);
        camera.target += self.pan_offset * applied;

        if self.config.damping_enabled {
            let retained = 1.0 - self.config.damping_factor;
            self.yaw_delta *= retained;
            self.pitch_delta *= retained;
            self.pan_offset *= retained;
        } else {
            self.yaw_delta = 0.0;
            self.pitch_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        // Dolly is never damped; whatever the wheel accumulated is now spent.
        self.scale = 1.0;

        let position = camera.position();
        let moved = position.distance_squared(self.last_position) > CHANGE_EPS;
        if moved {
            self.last_position = position;
        }
        moved
    }

    /// Pan by a pixel delta, keeping the point under the cursor under the
    /// cursor: the target shifts against the camera's screen axes, scaled so
    /// one pixel matches one pixel of the target plane.
    fn accumulate_pan(&mut self, delta: Vec2, camera: &OrbitCamera) {
        let world_per_pixel =
            2.0 * camera.radius * (camera.fov_y * 0.5).tan() / self.viewport_height;

        let forward = (camera.target - camera.position()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        self.pan_offset += right * (-delta.x * world_per_pixel) + up * (delta.y * world_per_pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW_H: u32 = 400;

    fn rig(damping_enabled: bool) -> (OrbitController, OrbitCamera) {
        let mut camera = OrbitCamera::default();
        let config = OrbitConfig {
            damping_enabled,
            ..OrbitConfig::default()
        };
        let mut controller = OrbitController::new(config, &mut camera);
        controller.set_viewport_height(VIEW_H);
        (controller, camera)
    }

    fn drag(
        controller: &mut OrbitController,
        camera: &OrbitCamera,
        mode: DragMode,
        from: Vec2,
        to: Vec2,
    ) {
        controller.pointer_moved(from, camera);
        match mode {
            DragMode::Rotate => controller.begin_rotate(),
            DragMode::Pan => controller.begin_pan(),
        }
        controller.pointer_moved(to, camera);
        controller.end_drag();
    }

    /// Run updates until the controller settles, panicking if it never does.
    fn settle(controller: &mut OrbitController, camera: &mut OrbitCamera) -> usize {
        for frame in 0..10_000 {
            if !controller.update(camera) {
                return frame;
            }
        }
        panic!("camera never settled");
    }

    #[test]
    fn fresh_controller_reports_no_motion() {
        let (mut controller, mut camera) = rig(true);
        assert!(!controller.update(&mut camera));
        assert!(!controller.update(&mut camera));
    }

    #[test]
    fn quiescent_updates_leave_camera_bitwise_identical() {
        let (mut controller, mut camera) = rig(true);
        let before = camera;
        controller.update(&mut camera);
        controller.update(&mut camera);
        assert_eq!(camera, before);
    }

    #[test]
    fn undamped_drag_applies_fully_in_one_update() {
        let (mut controller, mut camera) = rig(false);
        // A half-height horizontal drag, worth half a turn.
        drag(
            &mut controller,
            &camera,
            DragMode::Rotate,
            Vec2::new(0.0, 50.0),
            Vec2::new(VIEW_H as f32 / 2.0, 50.0),
        );

        assert!(controller.update(&mut camera));
        assert!((camera.yaw - (-TAU / 2.0)).abs() < 1e-4);
        assert_eq!(camera.pitch, 0.0);

        // Everything was consumed; the next update is settled.
        assert!(!controller.update(&mut camera));
    }

    #[test]
    fn damped_drag_applies_a_fraction_then_decays() {
        let (mut controller, mut camera) = rig(true);
        drag(
            &mut controller,
            &camera,
            DragMode::Rotate,
            Vec2::new(0.0, 50.0),
            Vec2::new(VIEW_H as f32, 50.0),
        );

        let full = -TAU;
        assert!(controller.update(&mut camera));
        assert!((camera.yaw - full * 0.05).abs() < 1e-4);

        // Second update applies the damping fraction of the decayed rest.
        assert!(controller.update(&mut camera));
        let expected = full * 0.05 + full * 0.95 * 0.05;
        assert!((camera.yaw - expected).abs() < 1e-4);
    }

    #[test]
    fn damped_drag_coasts_to_the_undamped_endpoint() {
        let (mut controller, mut camera) = rig(true);
        drag(
            &mut controller,
            &camera,
            DragMode::Rotate,
            Vec2::new(0.0, 0.0),
            Vec2::new(120.0, 80.0),
        );

        // Keep updating until the controller has been quiet for a stretch;
        // single quiet frames can be followed by residual inertia creeping
        // back over the change threshold.
        let mut active_frames = 0;
        let mut quiet_run = 0;
        for _ in 0..10_000 {
            if controller.update(&mut camera) {
                active_frames += 1;
                quiet_run = 0;
            } else {
                quiet_run += 1;
                if quiet_run == 50 {
                    break;
                }
            }
        }

        assert!(active_frames > 1, "damping should spread motion over frames");
        assert_eq!(quiet_run, 50, "inertia should bleed off completely");

        // The accumulated drag eventually applies in full.
        assert!((camera.yaw - (-TAU * 120.0 / VIEW_H as f32)).abs() < 1e-3);
        assert!((camera.pitch - TAU * 80.0 / VIEW_H as f32).abs() < 1e-3);
    }

    #[test]
    fn rotate_drag_does_not_touch_radius_or_target() {
        let (mut controller, mut camera) = rig(true);
        drag(
            &mut controller,
            &camera,
            DragMode::Rotate,
            Vec2::new(10.0, 10.0),
            Vec2::new(90.0, 60.0),
        );
        settle(&mut controller, &mut camera);

        assert_eq!(camera.radius, 2.0);
        assert_eq!(camera.target, Vec3::ZERO);
        assert!(camera.yaw != 0.0 && camera.pitch != 0.0);
    }

    #[test]
    fn dolly_is_exempt_from_damping() {
        let (mut controller, mut camera) = rig(true);
        controller.zoom_steps(1.0);

        assert!(controller.update(&mut camera));
        assert!((camera.radius - 2.0 * 0.95).abs() < 1e-6);

        // Fully spent: the follow-up update reports settled.
        assert!(!controller.update(&mut camera));
        assert!((camera.radius - 2.0 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn dolly_clamps_to_radius_limits() {
        let (mut controller, mut camera) = rig(false);
        for _ in 0..500 {
            controller.zoom_steps(1.0);
            controller.update(&mut camera);
        }
        assert_eq!(camera.radius, controller.config.min_radius);
        // Pinned at the limit, further dolly reports no motion.
        controller.zoom_steps(1.0);
        assert!(!controller.update(&mut camera));
    }

    #[test]
    fn pitch_clamps_at_the_poles() {
        let (mut controller, mut camera) = rig(false);
        drag(
            &mut controller,
            &camera,
            DragMode::Rotate,
            Vec2::new(0.0, 10_000.0),
            Vec2::new(0.0, 0.0),
        );
        controller.update(&mut camera);

        assert_eq!(camera.pitch, -MAX_PITCH);
        assert!(camera.position().is_finite());

        // Panning at the clamp must stay well-defined.
        drag(
            &mut controller,
            &camera,
            DragMode::Pan,
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 0.0),
        );
        controller.update(&mut camera);
        assert!(camera.target.is_finite());
    }

    #[test]
    fn pan_shifts_target_and_camera_together() {
        let (mut controller, mut camera) = rig(false);
        let offset_before = camera.position() - camera.target;

        // Drag 100 px right and 100 px down.
        drag(
            &mut controller,
            &camera,
            DragMode::Pan,
            Vec2::new(100.0, 100.0),
            Vec2::new(200.0, 200.0),
        );
        assert!(controller.update(&mut camera));

        // Looking down -Z: rightward drag shifts the target toward -X,
        // downward drag shifts it up.
        let world_per_pixel = 2.0 * 2.0 * (camera.fov_y * 0.5).tan() / VIEW_H as f32;
        let expected = Vec3::new(-100.0 * world_per_pixel, 100.0 * world_per_pixel, 0.0);
        assert!((camera.target - expected).length() < 1e-4);

        // Pan translates the whole orbit; the offset is untouched.
        let offset_after = camera.position() - camera.target;
        assert!((offset_after - offset_before).length() < 1e-5);
    }

    #[test]
    fn pointer_motion_without_drag_accumulates_nothing() {
        let (mut controller, mut camera) = rig(true);
        controller.pointer_moved(Vec2::new(5.0, 5.0), &camera);
        controller.pointer_moved(Vec2::new(500.0, 300.0), &camera);
        assert!(!controller.update(&mut camera));
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn ending_a_drag_stops_accumulation() {
        let (mut controller, mut camera) = rig(false);
        controller.pointer_moved(Vec2::new(0.0, 0.0), &camera);
        controller.begin_rotate();
        controller.pointer_moved(Vec2::new(40.0, 0.0), &camera);
        controller.end_drag();
        controller.pointer_moved(Vec2::new(400.0, 0.0), &camera);

        controller.update(&mut camera);
        let yaw_after_release = camera.yaw;
        assert!((yaw_after_release - (-TAU * 40.0 / VIEW_H as f32)).abs() < 1e-4);
    }
}
