use ndarray::{NdFloat, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

// Include submodules
mod common;
pub mod linalg;

// Re-export types from submodules
pub use common::{check_fit_inputs, check_predict_inputs, ShapeError};

pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }

    /// Interprets the value as a class index, if it is a non-negative integer.
    fn as_class_index(self) -> Option<usize> {
        if !self.is_finite() || self < Self::zero() || abs(self - self.round()) > Self::epsilon() {
            return None;
        }
        Some(self.round().as_())
    }
}

/// `Signed` and `num_traits::Float` both provide `abs`; this picks one.
pub fn abs<F: Float>(x: F) -> F {
    num_traits::Float::abs(x)
}

impl Float for f32 {}

impl Float for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_class_index() {
        assert_eq!(2.0_f64.as_class_index(), Some(2));
        assert_eq!(0.0_f32.as_class_index(), Some(0));
        assert_eq!(1.5_f64.as_class_index(), None);
        assert_eq!((-1.0_f64).as_class_index(), None);
        assert_eq!(f64::NAN.as_class_index(), None);
    }
}
