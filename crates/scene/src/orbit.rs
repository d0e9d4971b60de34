//! Pointer-driven orbit controls.
//!
//! Drag deltas and wheel steps accumulate between frames and are applied
//! to the camera in [`OrbitControls::update`], orbiting the eye on a sphere
//! around `target`.

use crate::camera::Camera;
use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Keeps the eye off the poles so `look_at` never degenerates.
const POLE_EPSILON: f32 = 1e-6;
const ZOOM_BASE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    drag: Option<DragMode>,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
    /// Pan drags in pixels, resolved against the camera at update time.
    pending_pan: Vec2,
    viewport_height: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            drag: None,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            pending_pan: Vec2::ZERO,
            viewport_height: 1.0,
        }
    }
}

impl OrbitControls {
    /// Controls that ignore every gesture.
    pub fn disabled() -> Self {
        Self {
            enable_rotate: false,
            enable_zoom: false,
            enable_pan: false,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enable_rotate || self.enable_zoom || self.enable_pan
    }

    pub fn dragging(&self) -> Option<DragMode> {
        self.drag
    }

    pub fn begin_drag(&mut self, mode: DragMode) {
        let allowed = match mode {
            DragMode::Rotate => self.enable_rotate,
            DragMode::Pan => self.enable_pan,
        };
        if allowed {
            self.drag = Some(mode);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Pointer moved by `delta` pixels in a viewport of `viewport` pixels.
    pub fn pointer_moved(&mut self, delta: Vec2, viewport: Vec2) {
        let height = viewport.y.max(1.0);
        self.viewport_height = height;
        match self.drag {
            Some(DragMode::Rotate) => {
                // A full-height drag turns the camera a full circle.
                self.theta_delta -= 2.0 * PI * delta.x / height * self.rotate_speed;
                self.phi_delta -= 2.0 * PI * delta.y / height * self.rotate_speed;
            }
            Some(DragMode::Pan) => self.pending_pan += delta * self.pan_speed,
            None => {}
        }
    }

    /// Mouse wheel; positive `lines` scrolls away from the user (zoom in).
    pub fn wheel(&mut self, lines: f32) {
        if !self.enable_zoom || lines == 0.0 {
            return;
        }
        let step = ZOOM_BASE.powf(self.zoom_speed * lines.abs());
        if lines > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    /// Apply accumulated gestures to `camera`. Returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if !self.is_enabled() {
            self.reset_pending();
            return false;
        }
        let offset = camera.eye - self.target;
        let radius = offset.length();

        if self.pending_pan != Vec2::ZERO && radius > 0.0 {
            let world_per_pixel = 2.0 * radius * (camera.fov_y * 0.5).tan() / self.viewport_height;
            self.pan_offset += -camera.right() * self.pending_pan.x * world_per_pixel
                + camera.screen_up() * self.pending_pan.y * world_per_pixel;
        }

        let moved = self.theta_delta != 0.0
            || self.phi_delta != 0.0
            || self.scale != 1.0
            || self.pan_offset != Vec3::ZERO;
        if !moved {
            self.reset_pending();
            return false;
        }

        // Spherical coordinates around +Y.
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };
        theta += self.theta_delta;
        phi = (phi + self.phi_delta).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset;
        let sin_phi = phi.sin();
        camera.eye = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
        camera.look_at(self.target);
        self.reset_pending();
        true
    }

    fn reset_pending(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;
        self.pending_pan = Vec2::ZERO;
    }
}
