use crate::motion::{FOLLOW_OFFSET, follow_pose};
use crate::picking::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Eye position plus the point it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

/// Perspective camera aimed at a target point.
/// Camera motion belongs to the scene layer, not the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(75.0, Vec3::new(0.0, 0.0, 5.0))
    }
}

impl Camera {
    pub fn perspective(fov_degrees: f32, eye: Vec3) -> Self {
        Self {
            eye,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.eye = pose.eye;
        self.target = pose.target;
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.eye,
            target: self.target,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or(Vec3::X)
    }

    /// Screen-space up, perpendicular to forward.
    pub fn screen_up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or(Vec3::Y)
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Screen position in pixels (origin top-left), or `None` behind the eye.
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        ))
    }

    /// Pixels per world unit for an object at `world`, for sizing labels.
    pub fn pixels_per_unit(&self, world: Vec3, viewport_height: f32) -> f32 {
        let depth = (world - self.eye).dot(self.forward()).max(self.near);
        viewport_height / (2.0 * (self.fov_y * 0.5).tan() * depth)
    }

    /// World-space ray through a screen position in pixels.
    pub fn ray_through(&self, screen: Vec2, viewport: Vec2) -> Ray {
        let ndc = Vec2::new(
            screen.x / viewport.x.max(1.0) * 2.0 - 1.0,
            1.0 - screen.y / viewport.y.max(1.0) * 2.0,
        );
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

/// Rigid third-person follow. Recomputed every frame, no smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowCamera {
    pub offset: Vec3,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            offset: FOLLOW_OFFSET,
        }
    }
}

impl FollowCamera {
    pub fn place(&self, camera: &mut Camera, subject: Vec3) {
        camera.set_pose(follow_pose(subject, self.offset));
    }
}

/// Moves the eye a fixed fraction of the remaining distance toward an
/// anchor every frame, then aims at `look_at`. Converges geometrically and
/// never lands exactly on the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LerpCamera {
    pub anchor: Vec3,
    pub factor: f32,
    pub look_at: Vec3,
}

impl Default for LerpCamera {
    fn default() -> Self {
        Self {
            anchor: Vec3::new(-0.5, 1.0, 2.0),
            factor: 0.05,
            look_at: Vec3::ZERO,
        }
    }
}

impl LerpCamera {
    pub fn update(&self, camera: &mut Camera) {
        camera.eye = camera.eye.lerp(self.anchor, self.factor);
        camera.look_at(self.look_at);
    }
}
