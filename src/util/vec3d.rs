use num::Float;
use std::fmt::Display;
use std::ops::Add;

/// A 3D vector generic over any floating point type.
///
/// The simulation uses a y-up world: `x`/`z` span the ground plane and `y` is altitude.
/// Rotations reuse the type as `(pitch, yaw, roll)`.
///
/// # Type Parameters
/// * `T` - The component type, most operations require `T: Float`.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Vec3D<T> {
    /// The x-component (east) of the vector.
    x: T,
    /// The y-component (up) of the vector.
    y: T,
    /// The z-component (north) of the vector.
    z: T,
}

impl<T: Copy> Vec3D<T> {
    /// Creates a new vector with the given components.
    pub const fn new(x: T, y: T, z: T) -> Self { Self { x, y, z } }

    /// Returns the x-component of the vector.
    pub const fn x(&self) -> T { self.x }

    /// Returns the y-component of the vector.
    pub const fn y(&self) -> T { self.y }

    /// Returns the z-component of the vector.
    pub const fn z(&self) -> T { self.z }

    /// Returns a copy with the y-component replaced.
    pub fn with_y(self, y: T) -> Self { Self { y, ..self } }
}

impl<T: Float> Vec3D<T> {
    /// Creates a zero vector.
    pub fn zero() -> Self { Self::new(T::zero(), T::zero(), T::zero()) }

    /// Creates a vector pointing from `self` to `other`.
    pub fn to(&self, other: &Self) -> Self {
        Self::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }

    /// Distance to `other` projected onto the ground plane, ignoring altitude.
    ///
    /// # Arguments
    /// * `other` - The other position.
    ///
    /// # Returns
    /// The Euclidean distance of the `x`/`z` components.
    pub fn horizontal_distance(&self, other: &Self) -> T {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Heading from `self` towards `other` on the ground plane, measured from `+z`
    /// towards `+x`, i.e. `atan2(dx, dz)`.
    pub fn heading_to(&self, other: &Self) -> T {
        let delta = self.to(other);
        delta.x.atan2(delta.z)
    }

    /// Unit vector on the ground plane for the given heading, scaled by `magnitude`.
    pub fn from_heading(heading: T, magnitude: T) -> Self {
        Self::new(heading.sin() * magnitude, T::zero(), heading.cos() * magnitude)
    }
}

impl<T: Float> Add for Vec3D<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output { Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z) }
}

impl<T: Display> Display for Vec3D<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.2}, {:.2}, {:.2}]", self.x, self.y, self.z)
    }
}

/// Wraps an angle in radians into `(-π, π]`.
pub fn wrap_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}
