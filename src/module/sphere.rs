use std::ops::{Add, Mul, Neg, Sub};

use crate::foundation::core::{ColorParams, PIXEL_CHANNELS, row_byte_len};
use crate::foundation::error::{FleetError, FleetResult};
use crate::module::{ModuleFactory, RowRenderer};

const EYE: Vec3 = Vec3::new(0.0, 0.0, -5.0);
const WALL_Z: f64 = 15.0;
const WALL_SIZE: f64 = 10.0;
const LIGHT_POS: Vec3 = Vec3::new(-10.0, 10.0, -10.0);
const LIGHT_INTENSITY: f64 = 0.9;

/// Phong material coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Phong {
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,
}

impl Default for Phong {
    fn default() -> Self {
        Self {
            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,
        }
    }
}

/// Factory for a single unit sphere at the origin, lit by one white point light.
///
/// `ColorParams` tints the sphere surface; each channel must be in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SphereModule {
    pub material: Phong,
}

impl SphereModule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleFactory for SphereModule {
    fn construct(&self, size: u32, params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        if size == 0 {
            return Err(FleetError::initialization("sphere module size must be > 0"));
        }
        if !params.is_unit() {
            return Err(FleetError::initialization(format!(
                "sphere color channels must be finite and within [0, 1], got {params:?}"
            )));
        }
        Ok(Box::new(SphereRenderer {
            size,
            color: Vec3::new(params.r, params.g, params.b),
            material: self.material,
            pixel_size: WALL_SIZE / f64::from(size),
        }))
    }
}

struct SphereRenderer {
    size: u32,
    color: Vec3,
    material: Phong,
    pixel_size: f64,
}

impl RowRenderer for SphereRenderer {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        if row >= self.size {
            return Err(FleetError::render(format!(
                "row {row} is outside image of height {}",
                self.size
            )));
        }

        let half = WALL_SIZE / 2.0;
        let world_y = half - self.pixel_size * f64::from(row);
        let mut out = Vec::with_capacity(row_byte_len(self.size));
        for x in 0..self.size {
            let world_x = -half + self.pixel_size * f64::from(x);
            let dir = (Vec3::new(world_x, world_y, WALL_Z) - EYE).normalized();
            let rgb = self.shade(dir);
            out.extend_from_slice(&to_rgba8(rgb));
        }
        debug_assert_eq!(out.len(), self.size as usize * PIXEL_CHANNELS);
        Ok(out)
    }
}

impl SphereRenderer {
    fn shade(&self, dir: Vec3) -> Vec3 {
        let Some(t) = hit_unit_sphere(EYE, dir) else {
            return Vec3::ZERO;
        };
        let point = EYE + dir * t;
        let normal = point.normalized();
        let eye = -dir;

        let m = self.material;
        let effective = self.color * LIGHT_INTENSITY;
        let light_v = (LIGHT_POS - point).normalized();
        let ambient = effective * m.ambient;

        let light_dot_normal = light_v.dot(normal);
        if light_dot_normal < 0.0 {
            return ambient;
        }
        let diffuse = effective * (m.diffuse * light_dot_normal);

        let reflect_v = (-light_v).reflect(normal);
        let reflect_dot_eye = reflect_v.dot(eye);
        let specular = if reflect_dot_eye <= 0.0 {
            Vec3::ZERO
        } else {
            let factor = reflect_dot_eye.powf(m.shininess);
            Vec3::splat(LIGHT_INTENSITY * m.specular * factor)
        };

        ambient + diffuse + specular
    }
}

/// Nearest non-negative `t` where `origin + dir * t` meets the unit sphere.
fn hit_unit_sphere(origin: Vec3, dir: Vec3) -> Option<f64> {
    let a = dir.dot(dir);
    let b = 2.0 * dir.dot(origin);
    let c = origin.dot(origin) - 1.0;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t1 = (-b - sq) / (2.0 * a);
    let t2 = (-b + sq) / (2.0 * a);
    [t1, t2].into_iter().filter(|t| *t >= 0.0).reduce(f64::min)
}

fn to_rgba8(c: Vec3) -> [u8; 4] {
    let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(c.x), q(c.y), q(c.z), 255]
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Vec3 {
    x: f64,
    y: f64,
    z: f64,
}

impl Vec3 {
    const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    fn dot(self, o: Self) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    fn normalized(self) -> Self {
        let len = self.dot(self).sqrt();
        if len == 0.0 { self } else { self * (1.0 / len) }
    }

    fn reflect(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/module/sphere.rs"]
mod tests;
