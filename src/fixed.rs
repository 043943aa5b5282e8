//! Deterministic fixed-point (Q16.16) arithmetic.
//!
//! Every quantity the physics core touches — positions, velocities, angles,
//! impulses — is a [`Fx`]. Addition and subtraction saturate instead of
//! wrapping; multiplication and division go through `i64` to avoid
//! intermediate overflow; `sqrt`/`sin`/`cos` are table-driven so every
//! platform that compiles this crate agrees to the bit.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use fixed::types::I16F16;

use crate::sin_table::{SIN_TABLE, SIN_TABLE_LEN};

/// Q16.16 fixed-point scalar. 1 unit = 65536; range ≈ [-32768, 32768).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Fx(i32);

const SCALE_BITS: u32 = 16;
const SCALE: i64 = 1 << SCALE_BITS;

impl Fx {
    pub const ZERO: Fx = Fx(0);
    pub const ONE: Fx = Fx(1 << SCALE_BITS);
    pub const HALF: Fx = Fx(1 << (SCALE_BITS - 1));
    pub const MAX: Fx = Fx(i32::MAX);
    pub const MIN: Fx = Fx(i32::MIN);
    /// 2*pi, rounded to the nearest Q16.16 bit pattern.
    pub const TAU: Fx = Fx(411_775);
    pub const PI: Fx = Fx(205_887);

    #[inline]
    pub const fn from_bits(bits: i32) -> Fx {
        Fx(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Build from an integer.
    #[inline]
    pub const fn from_int(v: i32) -> Fx {
        Fx(v.saturating_mul(1 << SCALE_BITS))
    }

    /// Build from an `f64`. Only ever used off the hot path (test fixtures,
    /// scenario setup, replay ingestion) — never inside a physics stage.
    #[inline]
    pub fn from_f64(v: f64) -> Fx {
        Fx(I16F16::saturating_from_num(v).to_bits())
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        I16F16::from_bits(self.0).to_num::<f64>()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn abs(self) -> Fx {
        Fx(self.0.saturating_abs())
    }

    #[inline]
    pub fn signum(self) -> Fx {
        match self.0.cmp(&0) {
            Ordering::Greater => Fx::ONE,
            Ordering::Less => -Fx::ONE,
            Ordering::Equal => Fx::ZERO,
        }
    }

    #[inline]
    pub fn min(self, other: Fx) -> Fx {
        if self.0 <= other.0 { self } else { other }
    }

    #[inline]
    pub fn max(self, other: Fx) -> Fx {
        if self.0 >= other.0 { self } else { other }
    }

    #[inline]
    pub fn clamp(self, lo: Fx, hi: Fx) -> Fx {
        self.max(lo).min(hi)
    }

    /// Deterministic integer square root via Newton's method, seeded by the
    /// operand's bit-length so iteration count is small and identical on
    /// every platform. Negative input returns zero (never NaN, never panics).
    pub fn sqrt(self) -> Fx {
        if self.0 <= 0 {
            return Fx::ZERO;
        }
        // Work in Q16.16 * Q16.16 = Q32.32 space via i64 to keep precision,
        // then take an integer sqrt of (value << 16) so the result is Q16.16.
        let radicand = (self.0 as i64) << SCALE_BITS;
        let mut x = isqrt_seed(radicand);
        if x == 0 {
            return Fx::ZERO;
        }
        // Newton iterations; 8 is always enough to converge for this range.
        for _ in 0..8 {
            let next = (x + radicand / x) / 2;
            if next == x {
                break;
            }
            x = next;
        }
        Fx(x as i32)
    }

    /// sin of an angle expressed in radians, as Fx. Table-driven, linearly
    /// interpolated between the 1024 baked samples over one turn.
    pub fn sin(self) -> Fx {
        lookup(self, 0)
    }

    /// cos of an angle expressed in radians, as Fx. Implemented as a
    /// quarter-turn phase shift into the same sine table.
    pub fn cos(self) -> Fx {
        lookup(self, SIN_TABLE_LEN / 4)
    }
}

/// Seed the Newton iteration with 2^(bitlen/2), a cheap and deterministic
/// starting point independent of any floating-point estimate.
fn isqrt_seed(v: i64) -> i64 {
    if v <= 0 {
        return 0;
    }
    let bits = 63 - v.leading_zeros() as i64;
    1i64 << ((bits / 2) + 1)
}

/// Shared sin/cos table lookup with linear interpolation; `phase_offset` in
/// table slots implements the cos-as-shifted-sin identity.
fn lookup(angle: Fx, phase_offset: usize) -> Fx {
    // angle is in radians; one table turn spans Fx::TAU radians. Reduce to
    // [0, TAU) first so the slot/fraction split below never sees a negative.
    let tau_bits = Fx::TAU.to_bits() as i64;
    let rem = (angle.to_bits() as i64).rem_euclid(tau_bits);

    let slot_span = tau_bits / SIN_TABLE_LEN as i64;
    let total_slots = (rem / slot_span.max(1)) as usize % SIN_TABLE_LEN;
    let frac_bits = rem - total_slots as i64 * slot_span.max(1);
    let t = ((frac_bits << SCALE_BITS) / slot_span.max(1)) as i64;

    let i0 = (total_slots + phase_offset) % SIN_TABLE_LEN;
    let i1 = (i0 + 1) % SIN_TABLE_LEN;
    let s0 = SIN_TABLE[i0] as i64;
    let s1 = SIN_TABLE[i1] as i64;
    let interpolated = s0 + (((s1 - s0) * t) >> SCALE_BITS);
    Fx(interpolated as i32)
}

impl Add for Fx {
    type Output = Fx;
    #[inline]
    fn add(self, rhs: Fx) -> Fx {
        Fx(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fx {
    type Output = Fx;
    #[inline]
    fn sub(self, rhs: Fx) -> Fx {
        Fx(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Fx {
    type Output = Fx;
    #[inline]
    fn neg(self) -> Fx {
        Fx(self.0.saturating_neg())
    }
}

impl AddAssign for Fx {
    #[inline]
    fn add_assign(&mut self, rhs: Fx) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fx {
    #[inline]
    fn sub_assign(&mut self, rhs: Fx) {
        *self = *self - rhs;
    }
}

impl Mul for Fx {
    type Output = Fx;
    #[inline]
    fn mul(self, rhs: Fx) -> Fx {
        let wide = (self.0 as i64 * rhs.0 as i64) >> SCALE_BITS;
        Fx(wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }
}

impl Div for Fx {
    type Output = Fx;
    #[inline]
    fn div(self, rhs: Fx) -> Fx {
        if rhs.0 == 0 {
            return Fx::ZERO;
        }
        let wide = ((self.0 as i64) << SCALE_BITS) / rhs.0 as i64;
        Fx(wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }
}

impl fmt::Debug for Fx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fx({:.6})", self.to_f64())
    }
}

impl fmt::Display for Fx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}

/// A 2D vector of [`Fx`] scalars, the only vector type the physics core uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct FxVec2 {
    pub x: Fx,
    pub y: Fx,
}

impl FxVec2 {
    pub const ZERO: FxVec2 = FxVec2 { x: Fx::ZERO, y: Fx::ZERO };

    #[inline]
    pub const fn new(x: Fx, y: Fx) -> FxVec2 {
        FxVec2 { x, y }
    }

    #[inline]
    pub fn dot(self, rhs: FxVec2) -> Fx {
        self.x * rhs.x + self.y * rhs.y
    }

    /// 2D "cross product": scalar z-component of the 3D cross of (x,y,0).
    #[inline]
    pub fn cross(self, rhs: FxVec2) -> Fx {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Cross of a scalar (z-component) with a vector: `s * (x,y) rotated 90°`.
    #[inline]
    pub fn cross_scalar(s: Fx, v: FxVec2) -> FxVec2 {
        FxVec2::new(-s * v.y, s * v.x)
    }

    #[inline]
    pub fn length_squared(self) -> Fx {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> Fx {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `Fx::ZERO` vector if this is
    /// (approximately) the zero vector — never divides by zero.
    #[inline]
    pub fn normalize_or_zero(self) -> FxVec2 {
        let len = self.length();
        if len.is_zero() {
            FxVec2::ZERO
        } else {
            FxVec2::new(self.x / len, self.y / len)
        }
    }

    /// Perpendicular vector, rotated 90° counter-clockwise.
    #[inline]
    pub fn perp(self) -> FxVec2 {
        FxVec2::new(-self.y, self.x)
    }

    #[inline]
    pub fn rotate(self, cos: Fx, sin: Fx) -> FxVec2 {
        FxVec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for FxVec2 {
    type Output = FxVec2;
    #[inline]
    fn add(self, rhs: FxVec2) -> FxVec2 {
        FxVec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for FxVec2 {
    type Output = FxVec2;
    #[inline]
    fn sub(self, rhs: FxVec2) -> FxVec2 {
        FxVec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for FxVec2 {
    type Output = FxVec2;
    #[inline]
    fn neg(self) -> FxVec2 {
        FxVec2::new(-self.x, -self.y)
    }
}

impl Mul<Fx> for FxVec2 {
    type Output = FxVec2;
    #[inline]
    fn mul(self, rhs: Fx) -> FxVec2 {
        FxVec2::new(self.x * rhs, self.y * rhs)
    }
}
