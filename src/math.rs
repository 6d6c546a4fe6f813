//! Small vector types and interpolation helpers
//!
//! Positions live in "hybrid" space: `x` and `y` are raster coordinates in
//! pixels, `z` is camera-space depth.

use std::ops::{Add, Mul, Neg, Sub};

/// Two component vector
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Three component vector
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    /// 2D cross product, z component of the 3D cross product
    pub fn cross(&self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }
    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }
    pub fn length(&self) -> f32 {
        self.dot(*self).sqrt()
    }
    /// Component-wise product
    pub fn mul_elem(&self, other: Vec2) -> Vec2 {
        Vec2::new(self.x * other.x, self.y * other.y)
    }
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
    /// Drop the depth component
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
    pub fn cross(&self, o: Vec3) -> Vec3 {
        Vec3::new(self.y * o.z - self.z * o.y,
                  self.z * o.x - self.x * o.z,
                  self.x * o.y - self.y * o.x)
    }
    pub fn dot(&self, o: Vec3) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 { Vec2::new(self.x + o.x, self.y + o.y) }
}
impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, o: Vec2) -> Vec2 { Vec2::new(self.x - o.x, self.y - o.y) }
}
impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 { Vec2::new(self.x * s, self.y * s) }
}
impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 { Vec2::new(-self.x, -self.y) }
}
impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, o: Vec3) -> Vec3 { Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z) }
}
impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, o: Vec3) -> Vec3 { Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z) }
}
impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 { Vec3::new(self.x * s, self.y * s, self.z * s) }
}

/// Linear interpolation between `a` and `b`
///
///     use hider::lerp;
///     assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
///
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a) * t + a
}

/// Linear interpolation of points
pub fn lerp3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.z, b.z, t))
}

/// Bilinear interpolation over the corners `a,b,c,d` of a quad
///
/// `a` sits at (0,0), `b` at (1,0), `c` at (1,1) and `d` at (0,1)
pub fn bilerp<T>(a: T, b: T, c: T, d: T, s: f32, t: f32) -> T
    where T: Mul<f32, Output=T> + Add<Output=T>
{
    a * ((1.0 - s) * (1.0 - t)) + b * (s * (1.0 - t)) + c * (s * t) + d * ((1.0 - s) * t)
}
