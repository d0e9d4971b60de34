//! Backdrop shared by both scenes: sky, star field, lights and ground.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;
use wingspan_assets::MeshVertex;

const NIGHT: Vec3 = Vec3::new(0.02, 0.02, 0.06);
const DUSK: Vec3 = Vec3::new(0.96, 0.62, 0.38);
const DAY: Vec3 = Vec3::new(0.42, 0.66, 0.94);

/// Linear RGB from a `#rrggbb` literal.
pub const fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// HSL to RGB, all components in `0..=1`.
pub fn hsl(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sky {
    pub sun_position: Vec3,
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            sun_position: Vec3::new(100.0, 10.0, 100.0),
        }
    }
}

impl Sky {
    /// Sun angle above the horizon, radians.
    pub fn sun_elevation(&self) -> f32 {
        let dir = self.sun_position.normalize_or(Vec3::Y);
        dir.y.clamp(-1.0, 1.0).asin()
    }

    /// Background colour for the current sun: night below the horizon,
    /// dusk near it, day above.
    pub fn clear_color(&self) -> [f32; 3] {
        let elevation = self.sun_elevation();
        let color = if elevation < 0.0 {
            NIGHT.lerp(DUSK, smoothstep(-0.2, 0.0, elevation))
        } else {
            DUSK.lerp(DAY, smoothstep(0.0, 0.35, elevation))
        };
        color.to_array()
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarPoint {
    pub position: Vec3,
    pub color: [f32; 3],
    pub size: f32,
}

/// Star shell between `radius` and `radius + depth`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stars {
    pub radius: f32,
    pub depth: f32,
    pub count: usize,
    pub factor: f32,
    pub saturation: f32,
    /// Soft round point edges.
    pub fade: bool,
}

impl Default for Stars {
    fn default() -> Self {
        Self {
            radius: 300.0,
            depth: 50.0,
            count: 5000,
            factor: 4.0,
            saturation: 0.0,
            fade: false,
        }
    }
}

impl Stars {
    /// Deterministic star positions for `seed`. Stars are placed from the
    /// outer shell inward; hue walks the colour wheel with the index.
    pub fn points(&self, seed: u64) -> Vec<StarPoint> {
        let mut rng = SplitMix64(seed);
        let mut r = self.radius + self.depth;
        let increment = if self.count > 0 {
            self.depth / self.count as f32
        } else {
            0.0
        };
        (0..self.count)
            .map(|i| {
                r -= increment * rng.next_f32();
                let phi = (1.0 - rng.next_f32() * 2.0).acos();
                let theta = rng.next_f32() * TAU;
                let position = Vec3::new(
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                    r * phi.sin() * theta.cos(),
                );
                StarPoint {
                    position,
                    color: hsl(i as f32 / self.count as f32, self.saturation, 0.9),
                    size: (0.5 + 0.5 * rng.next_f32()) * self.factor,
                }
            })
            .collect()
    }
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        intensity: f32,
    },
    Directional {
        position: Vec3,
        intensity: f32,
        cast_shadow: bool,
    },
    Point {
        position: Vec3,
        intensity: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ground {
    /// Flat wireframe grid in the XZ plane.
    WireframePlane {
        size: Vec2,
        segments: u32,
        color: [f32; 3],
    },
    /// Solid disk in the XZ plane.
    Disk {
        radius: f32,
        segments: u32,
        color: [f32; 3],
    },
}

impl Ground {
    pub fn terrain() -> Self {
        Ground::WireframePlane {
            size: Vec2::splat(100.0),
            segments: 50,
            color: rgb(0x4a7349),
        }
    }

    pub fn city_disk() -> Self {
        Ground::Disk {
            radius: 30.0,
            segments: 32,
            color: rgb(0x3f7b9d),
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match *self {
            Ground::WireframePlane { color, .. } | Ground::Disk { color, .. } => color,
        }
    }

    /// Edge list of the triangulated plane: grid lines plus one diagonal
    /// per cell. Empty for solid grounds.
    pub fn wire_lines(&self) -> Vec<[Vec3; 2]> {
        let Ground::WireframePlane { size, segments, .. } = *self else {
            return Vec::new();
        };
        let n = segments.max(1);
        let step = size / n as f32;
        let half = size * 0.5;
        let at = |ix: u32, iz: u32| {
            Vec3::new(
                ix as f32 * step.x - half.x,
                0.0,
                iz as f32 * step.y - half.y,
            )
        };
        let mut lines = Vec::with_capacity(((n + 1) * 2 + n * n) as usize);
        for i in 0..=n {
            lines.push([at(i, 0), at(i, n)]);
            lines.push([at(0, i), at(n, i)]);
        }
        for iz in 0..n {
            for ix in 0..n {
                lines.push([at(ix, iz + 1), at(ix + 1, iz)]);
            }
        }
        lines
    }

    /// Triangle fan of the disk, facing +Y. Empty for wireframe grounds.
    pub fn disk_mesh(&self) -> (Vec<MeshVertex>, Vec<u32>) {
        let Ground::Disk {
            radius, segments, ..
        } = *self
        else {
            return (Vec::new(), Vec::new());
        };
        let n = segments.max(3);
        let normal = [0.0, 1.0, 0.0];
        let mut vertices = Vec::with_capacity(n as usize + 1);
        vertices.push(MeshVertex {
            position: [0.0; 3],
            normal,
        });
        for i in 0..n {
            let a = i as f32 / n as f32 * TAU;
            vertices.push(MeshVertex {
                position: [radius * a.cos(), 0.0, -radius * a.sin()],
                normal,
            });
        }
        let mut indices = Vec::with_capacity(n as usize * 3);
        for i in 0..n {
            indices.extend([0, i + 1, (i + 1) % n + 1]);
        }
        (vertices, indices)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub sky: Sky,
    pub stars: Stars,
    pub lights: Vec<Light>,
}

impl Environment {
    pub fn ambient_intensity(&self) -> f32 {
        self.lights
            .iter()
            .map(|l| match l {
                Light::Ambient { intensity } => *intensity,
                _ => 0.0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        let c = rgb(0x4a7349);
        assert!((c[0] - 74.0 / 255.0).abs() < 1e-6);
        assert!((c[1] - 115.0 / 255.0).abs() < 1e-6);
        assert!((c[2] - 73.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert_eq!(hsl(0.37, 0.0, 0.9), [0.9, 0.9, 0.9]);
        let red = hsl(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6 && red[2].abs() < 1e-6);
    }

    #[test]
    fn low_sun_gives_dusk_sky() {
        let sky = Sky::default();
        let elevation = sky.sun_elevation();
        assert!(elevation > 0.0 && elevation < 0.1);
        let c = sky.clear_color();
        assert!(c[0] > c[2]);
        let noon = Sky {
            sun_position: Vec3::new(0.0, 100.0, 0.0),
        };
        let c = noon.clear_color();
        assert!(c[2] > c[0]);
    }

    #[test]
    fn stars_stay_in_their_shell() {
        let stars = Stars {
            count: 500,
            ..Stars::default()
        };
        let points = stars.points(7);
        assert_eq!(points.len(), 500);
        for p in &points {
            let r = p.position.length();
            assert!(r >= 299.0 && r <= 350.01, "r = {r}");
            assert!(p.size >= 2.0 && p.size <= 4.0);
        }
        assert_eq!(points, stars.points(7));
        assert_ne!(points[0].position, stars.points(8)[0].position);
    }

    #[test]
    fn terrain_wireframe_edges() {
        let lines = Ground::terrain().wire_lines();
        assert_eq!(lines.len(), 51 * 2 + 50 * 50);
        for [a, b] in &lines {
            assert!(a.x.abs() <= 50.0 && b.z.abs() <= 50.0);
        }
        assert!(Ground::city_disk().wire_lines().is_empty());
    }

    #[test]
    fn disk_fan_covers_radius() {
        let (vertices, indices) = Ground::city_disk().disk_mesh();
        assert_eq!(vertices.len(), 33);
        assert_eq!(indices.len(), 32 * 3);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        let far = vertices
            .iter()
            .map(|v| Vec3::from(v.position).length())
            .fold(0.0f32, f32::max);
        assert!((far - 30.0).abs() < 1e-4);
    }

    #[test]
    fn ambient_sums_ambient_lights_only() {
        let env = Environment {
            sky: Sky::default(),
            stars: Stars::default(),
            lights: vec![
                Light::Ambient { intensity: 0.3 },
                Light::Point {
                    position: Vec3::splat(10.0),
                    intensity: 0.5,
                },
            ],
        };
        assert!((env.ambient_intensity() - 0.3).abs() < 1e-6);
    }
}
