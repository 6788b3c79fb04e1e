use std::{
    fmt,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    variant::ValueType,
};

/// Complex number with the memory layout of the platform `double _Complex`.
///
/// The `#[repr(C)]` layout (real part first, then imaginary part, no padding)
/// is load-bearing: slices of `Complex` are handed to linear-algebra kernels as
/// interleaved `f64` pairs without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub real: f64,
    pub imag: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex::new(0.0, 0.0);
    pub const ONE: Complex = Complex::new(1.0, 0.0);
    pub const I: Complex = Complex::new(0.0, 1.0);

    pub const fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    pub const fn from_real(real: f64) -> Self {
        Self { real, imag: 0.0 }
    }

    pub const fn nan() -> Self {
        Self {
            real: f64::NAN,
            imag: f64::NAN,
        }
    }

    pub fn real(self) -> f64 {
        self.real
    }

    pub fn imag(self) -> f64 {
        self.imag
    }

    pub fn set_real(&mut self, real: f64) {
        self.real = real;
    }

    pub fn set_imag(&mut self, imag: f64) {
        self.imag = imag;
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.real, self.imag]
    }

    pub fn from_array(parts: [f64; 2]) -> Self {
        Self::new(parts[0], parts[1])
    }

    pub fn conj(self) -> Self {
        Self::new(self.real, -self.imag)
    }

    /// Modulus, computed without intermediate overflow.
    pub fn abs(self) -> f64 {
        self.real.hypot(self.imag)
    }

    pub fn arg(self) -> f64 {
        self.imag.atan2(self.real)
    }

    pub fn norm_squared(self) -> f64 {
        self.real * self.real + self.imag * self.imag
    }

    pub fn is_nan(self) -> bool {
        self.real.is_nan() || self.imag.is_nan()
    }

    pub fn is_infinite(self) -> bool {
        self.real.is_infinite() || self.imag.is_infinite()
    }

    pub fn is_finite(self) -> bool {
        self.real.is_finite() && self.imag.is_finite()
    }

    /// True when the value is exactly zero in both components.
    pub fn is_zero(self) -> bool {
        self.real == 0.0 && self.imag == 0.0
    }

    /// True when the imaginary part is exactly zero.
    pub fn is_essentially_real(self) -> bool {
        self.imag == 0.0
    }

    /// Projection used by the cross-type total order. Not a norm.
    pub fn ordering_projection(self) -> f64 {
        self.real + self.imag
    }

    /// Integer power by repeated squaring.
    pub fn powi(self, exponent: i64) -> Self {
        if exponent < 0 {
            return Complex::ONE / self.powu(exponent.unsigned_abs());
        }
        self.powu(exponent as u64)
    }

    fn powu(self, exponent: u64) -> Self {
        let mut result = Complex::ONE;
        let mut base = self;
        let mut remaining = exponent;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            remaining >>= 1;
        }
        result
    }

    pub fn exp(self) -> Self {
        let scale = self.real.exp();
        Self::new(scale * self.imag.cos(), scale * self.imag.sin())
    }

    pub fn sqrt(self) -> Self {
        if self.is_zero() {
            return Self::new(0.0, self.imag);
        }
        let modulus = self.abs();
        let real = ((modulus + self.real) / 2.0).sqrt();
        let imag = ((modulus - self.real) / 2.0).sqrt().copysign(self.imag);
        Self::new(real, imag)
    }

    fn ordering_operands(self, other: Complex) -> RuntimeResult<Option<(f64, f64)>> {
        if self.is_essentially_real() && other.is_essentially_real() {
            Ok(Some((self.real, other.real)))
        } else {
            raise(
                RuntimeError::type_conversion(ValueType::Complex, ValueType::Real),
                None,
            )
        }
    }

    /// `<` defined only for essentially real operands.
    pub fn try_lt(self, other: Complex) -> RuntimeResult<bool> {
        Ok(self.ordering_operands(other)?.is_some_and(|(a, b)| a < b))
    }

    pub fn try_gt(self, other: Complex) -> RuntimeResult<bool> {
        Ok(self.ordering_operands(other)?.is_some_and(|(a, b)| a > b))
    }

    pub fn try_le(self, other: Complex) -> RuntimeResult<bool> {
        Ok(self.ordering_operands(other)?.is_some_and(|(a, b)| a <= b))
    }

    pub fn try_ge(self, other: Complex) -> RuntimeResult<bool> {
        Ok(self.ordering_operands(other)?.is_some_and(|(a, b)| a >= b))
    }
}

impl From<f64> for Complex {
    fn from(value: f64) -> Self {
        Complex::from_real(value)
    }
}

impl From<i64> for Complex {
    fn from(value: i64) -> Self {
        Complex::from_real(value as f64)
    }
}

impl From<bool> for Complex {
    fn from(value: bool) -> Self {
        Complex::from_real(if value { 1.0 } else { 0.0 })
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.imag.is_sign_negative() && !self.imag.is_nan() {
            write!(f, "{} - {}i", self.real, -self.imag)
        } else {
            write!(f, "{} + {}i", self.real, self.imag)
        }
    }
}

fn copysign_unit(value: f64) -> f64 {
    (if value.is_infinite() { 1.0_f64 } else { 0.0_f64 }).copysign(value)
}

fn zero_if_nan(value: f64) -> f64 {
    if value.is_nan() { 0.0f64.copysign(value) } else { value }
}

/// Complex product following C99 Annex G (`__muldc3`).
fn multiply(left: Complex, right: Complex) -> Complex {
    let (mut a, mut b) = (left.real, left.imag);
    let (mut c, mut d) = (right.real, right.imag);
    let ac = a * c;
    let bd = b * d;
    let ad = a * d;
    let bc = b * c;
    let mut x = ac - bd;
    let mut y = ad + bc;

    if x.is_nan() && y.is_nan() {
        let mut recalculate = false;
        if a.is_infinite() || b.is_infinite() {
            a = copysign_unit(a);
            b = copysign_unit(b);
            c = zero_if_nan(c);
            d = zero_if_nan(d);
            recalculate = true;
        }
        if c.is_infinite() || d.is_infinite() {
            c = copysign_unit(c);
            d = copysign_unit(d);
            a = zero_if_nan(a);
            b = zero_if_nan(b);
            recalculate = true;
        }
        if !recalculate
            && (ac.is_infinite() || bd.is_infinite() || ad.is_infinite() || bc.is_infinite())
        {
            a = zero_if_nan(a);
            b = zero_if_nan(b);
            c = zero_if_nan(c);
            d = zero_if_nan(d);
            recalculate = true;
        }
        if recalculate {
            x = f64::INFINITY * (a * c - b * d);
            y = f64::INFINITY * (a * d + b * c);
        }
    }
    Complex::new(x, y)
}

/// Complex quotient following libgcc's `__divdc3`: Smith's algorithm with
/// power-of-two prescaling, then the C99 Annex G recovery of infinities and
/// zeros that computed as NaN + NaN i.
fn divide(numerator: Complex, denominator: Complex) -> Complex {
    const RBIG: f64 = f64::MAX / 2.0;
    const RMIN: f64 = f64::MIN_POSITIVE;
    const RMIN2: f64 = f64::EPSILON;
    const RMINSCAL: f64 = 1.0 / f64::EPSILON;
    const RMAX2: f64 = RBIG * RMIN2;

    let (mut a, mut b) = (numerator.real, numerator.imag);
    let (mut c, mut d) = (denominator.real, denominator.imag);
    let mut x;
    let mut y;

    // `pivot` is the larger of |c| and |d|; both branches scale by it.
    let small_numerator =
        |a: f64, b: f64, pivot: f64| a.abs() < RMIN && b.abs() < RMAX2 && pivot.abs() < RMAX2;
    if c.abs() < d.abs() {
        if d.abs() >= RBIG {
            (a, b, c, d) = (a / 2.0, b / 2.0, c / 2.0, d / 2.0);
        }
        if d.abs() < RMIN2 || small_numerator(a, b, d) || small_numerator(b, a, d) {
            (a, b, c, d) = (a * RMINSCAL, b * RMINSCAL, c * RMINSCAL, d * RMINSCAL);
        }
        let ratio = c / d;
        let denom = c * ratio + d;
        if ratio.abs() > RMIN {
            x = (a * ratio + b) / denom;
            y = (b * ratio - a) / denom;
        } else {
            x = (c * (a / d) + b) / denom;
            y = (c * (b / d) - a) / denom;
        }
    } else {
        if c.abs() >= RBIG {
            (a, b, c, d) = (a / 2.0, b / 2.0, c / 2.0, d / 2.0);
        }
        if c.abs() < RMIN2 || small_numerator(a, b, c) || small_numerator(b, a, c) {
            (a, b, c, d) = (a * RMINSCAL, b * RMINSCAL, c * RMINSCAL, d * RMINSCAL);
        }
        let ratio = d / c;
        let denom = d * ratio + c;
        if ratio.abs() > RMIN {
            x = (b * ratio + a) / denom;
            y = (b - a * ratio) / denom;
        } else {
            x = (a + d * (b / c)) / denom;
            y = (b - d * (a / c)) / denom;
        }
    }

    if x.is_nan() && y.is_nan() {
        if c == 0.0 && d == 0.0 && (!a.is_nan() || !b.is_nan()) {
            x = f64::INFINITY.copysign(c) * a;
            y = f64::INFINITY.copysign(c) * b;
        } else if (a.is_infinite() || b.is_infinite()) && c.is_finite() && d.is_finite() {
            a = copysign_unit(a);
            b = copysign_unit(b);
            x = f64::INFINITY * (a * c + b * d);
            y = f64::INFINITY * (b * c - a * d);
        } else if (c.is_infinite() || d.is_infinite()) && a.is_finite() && b.is_finite() {
            c = copysign_unit(c);
            d = copysign_unit(d);
            x = 0.0 * (a * c + b * d);
            y = 0.0 * (b * c - a * d);
        }
    }
    Complex::new(x, y)
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.real + rhs.real, self.imag + rhs.imag)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.real - rhs.real, self.imag - rhs.imag)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        multiply(self, rhs)
    }
}

impl Div for Complex {
    type Output = Complex;

    fn div(self, rhs: Complex) -> Complex {
        divide(self, rhs)
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex::new(-self.real, -self.imag)
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;

    fn mul(self, rhs: f64) -> Complex {
        Complex::new(self.real * rhs, self.imag * rhs)
    }
}

impl Div<f64> for Complex {
    type Output = Complex;

    fn div(self, rhs: f64) -> Complex {
        Complex::new(self.real / rhs, self.imag / rhs)
    }
}

impl AddAssign for Complex {
    fn add_assign(&mut self, rhs: Complex) {
        *self = *self + rhs;
    }
}

impl SubAssign for Complex {
    fn sub_assign(&mut self, rhs: Complex) {
        *self = *self - rhs;
    }
}

impl MulAssign for Complex {
    fn mul_assign(&mut self, rhs: Complex) {
        *self = *self * rhs;
    }
}

impl DivAssign for Complex {
    fn div_assign(&mut self, rhs: Complex) {
        *self = *self / rhs;
    }
}

impl std::iter::Sum for Complex {
    fn sum<I: Iterator<Item = Complex>>(iter: I) -> Self {
        iter.fold(Complex::ZERO, |acc, value| acc + value)
    }
}
