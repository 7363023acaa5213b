//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation state uses fixed-point arithmetic so that two runs with
//! the same inputs produce bit-identical results. Conversion to `f32` only
//! happens at the snapshot boundary, where the data leaves the core.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Component size above which lengths are taken on a rescaled copy
/// (2^14, so three squared components still fit).
const PRESCALE_LIMIT: Fixed = Fixed::from_bits(1 << 46);

/// Fixed-point 3D vector. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate (vertical).
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Authored data (RON unit definitions, scenarios) writes plain decimal
/// numbers, so values go through `f64` on the way in and out.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Build a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let d = other - self;
        d.dot(d)
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        (other - self).length()
    }

    /// Dot product of two vectors. Saturates instead of overflowing.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
            .saturating_add(self.z.saturating_mul(other.z))
    }

    /// Vector length. Saturates instead of overflowing.
    #[must_use]
    pub fn length(self) -> Fixed {
        let largest = self.max_abs_component();
        if largest > PRESCALE_LIMIT {
            // Squaring components this large would saturate the dot product.
            return fixed_sqrt(self.divided_by(largest).dot_self()).saturating_mul(largest);
        }
        fixed_sqrt(self.dot_self())
    }

    /// Scale by a scalar, saturating per component.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(
            self.x.saturating_mul(factor),
            self.y.saturating_mul(factor),
            self.z.saturating_mul(factor),
        )
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let largest = self.max_abs_component();
        let v = if largest > PRESCALE_LIMIT {
            self.divided_by(largest)
        } else {
            self
        };
        let len = fixed_sqrt(v.dot_self());
        if len == Fixed::ZERO {
            return Self::ZERO;
        }
        v.divided_by(len)
    }

    fn dot_self(self) -> Fixed {
        self.dot(self)
    }

    fn max_abs_component(self) -> Fixed {
        self.x
            .saturating_abs()
            .max(self.y.saturating_abs())
            .max(self.z.saturating_abs())
    }

    fn divided_by(self, divisor: Fixed) -> Self {
        Self::new(self.x / divisor, self.y / divisor, self.z / divisor)
    }

    /// Direction on the horizontal plane, vertical component dropped.
    ///
    /// Returns `None` when the two points are vertically aligned.
    #[must_use]
    pub fn horizontal_direction_to(self, other: Self) -> Option<Self> {
        let mut d = other - self;
        d.y = Fixed::ZERO;
        let dir = d.normalize();
        (dir != Self::ZERO).then_some(dir)
    }

    /// Step toward `target` by at most `max_step`, never overshooting.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: Fixed) -> Self {
        let diff = target - self;
        let dist = diff.length();
        if dist <= max_step || dist == Fixed::ZERO {
            return target;
        }
        self + diff.scale(max_step / dist)
    }

    /// Lossy conversion for data leaving the core.
    #[must_use]
    pub fn to_f32_array(self) -> [f32; 3] {
        [self.x.to_num(), self.y.to_num(), self.z.to_num()]
    }

    /// Build a vector from `f32` components (snapshot and command inputs).
    #[must_use]
    pub fn from_f32_array(v: [f32; 3]) -> Self {
        Self::new(
            Fixed::saturating_from_num(v[0]),
            Fixed::saturating_from_num(v[1]),
            Fixed::saturating_from_num(v[2]),
        )
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    // Upper bound must square to strictly more than `value`.
    let mut high = value.max(Fixed::ONE).saturating_add(Fixed::ONE);

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.x.saturating_add(rhs.x),
            self.y.saturating_add(rhs.y),
            self.z.saturating_add(rhs.z),
        )
    }
}

impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(
            self.x.saturating_sub(rhs.x),
            self.y.saturating_sub(rhs.y),
            self.z.saturating_sub(rhs.z),
        )
    }
}
