//! Small `Copy` vector types used for foot positions and stride vectors.
//!
//! Coordinates are millimetres in a leg's local frame: `x` points away from the
//! body along the leg's neutral direction, `y` is lateral to it and `z` is up.
use core::fmt::Display;
use core::ops::{Add, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y)
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag <= f32::EPSILON {
            return Vec2::ZERO;
        }
        self / mag
    }

    /// Shrinks the vector onto the circle of radius `max` if it lies outside it.
    pub fn clamp_length(self, max: f32) -> Self {
        let mag = self.magnitude();
        if mag > max {
            self * (max / mag)
        } else {
            self
        }
    }

    /// Rotates around the origin by `angle_deg` (counter-clockwise).
    pub fn rotate(self, angle_deg: f32) -> Self {
        let (sin, cos) = libm::sincosf(angle_deg.to_radians());
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn up(z: f32) -> Self {
        Self::new(0.0, 0.0, z)
    }

    pub fn magnitude(self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    pub fn distance_to(self, other: Vec3) -> f32 {
        (self - other).magnitude()
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn lerp(self, other: Vec3, f: f32) -> Vec3 {
        self * (1.0 - f) + other * f
    }

    /// Rotates the point in the xy plane around `pivot` by `angle_deg`, keeping `z`.
    pub fn rotate(self, angle_deg: f32, pivot: Vec2) -> Vec3 {
        let rotated = Vec2::new(self.x - pivot.x, self.y - pivot.y).rotate(angle_deg);
        Vec3::new(rotated.x + pivot.x, rotated.y + pivot.y, self.z)
    }
}

impl From<Vec2> for Vec3 {
    fn from(v: Vec2) -> Self {
        Vec3::new(v.x, v.y, 0.0)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Display for Vec3 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}
