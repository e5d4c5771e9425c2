//! Population vectors: one value per selected model point

use serde::{Serialize, Serializer};
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

/// Immutable vector over the model points of one run
///
/// Cloning is cheap (shared buffer), which is what lets the cell cache hand the
/// same evaluated vector to every caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Series(Arc<[f64]>);

impl Series {
    pub fn zeros(len: usize) -> Self {
        Self::filled(len, 0.0)
    }

    pub fn filled(len: usize, value: f64) -> Self {
        Self(vec![value; len].into())
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(values.into())
    }

    pub fn from_fn(len: usize, f: impl FnMut(usize) -> f64) -> Self {
        Self((0..len).map(f).collect::<Vec<_>>().into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, i: usize) -> f64 {
        self.0[i]
    }

    /// Population total
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        Self(self.0.iter().map(|&v| f(v)).collect::<Vec<_>>().into())
    }

    pub fn zip_with(&self, other: &Series, f: impl Fn(f64, f64) -> f64) -> Series {
        debug_assert_eq!(self.len(), other.len(), "population vectors must share an index");
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(&a, &b)| f(a, b))
                .collect::<Vec<_>>()
                .into(),
        )
    }

    pub fn scale(&self, factor: f64) -> Series {
        self.map(|v| v * factor)
    }

    /// max(0, x) elementwise
    pub fn positive_part(&self) -> Series {
        self.map(|v| v.max(0.0))
    }

    /// Zero wherever `mask` is false.
    pub fn keep(&self, mask: &[bool]) -> Series {
        debug_assert_eq!(self.len(), mask.len());
        Self(
            self.0
                .iter()
                .zip(mask)
                .map(|(&v, &m)| if m { v } else { 0.0 })
                .collect::<Vec<_>>()
                .into(),
        )
    }

    /// Elementwise `if mask { when_true } else { when_false }`.
    pub fn choose(mask: &[bool], when_true: &Series, when_false: &Series) -> Series {
        debug_assert_eq!(when_true.len(), mask.len());
        debug_assert_eq!(when_false.len(), mask.len());
        Self::from_fn(mask.len(), |i| {
            if mask[i] {
                when_true.0[i]
            } else {
                when_false.0[i]
            }
        })
    }

    /// Elementwise ratio, zero where the denominator is zero.
    pub fn ratio(&self, denominator: &Series) -> Series {
        self.zip_with(denominator, |n, d| if d.abs() > 0.0 { n / d } else { 0.0 })
    }

    /// Sum of several vectors of the same population.
    pub fn total<'a>(len: usize, parts: impl IntoIterator<Item = &'a Series>) -> Series {
        let mut acc = vec![0.0; len];
        for part in parts {
            for (a, v) in acc.iter_mut().zip(part.values()) {
                *a += v;
            }
        }
        Self::from_vec(acc)
    }
}

impl Serialize for Series {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl Add for &Series {
    type Output = Series;

    fn add(self, rhs: &Series) -> Series {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &Series {
    type Output = Series;

    fn sub(self, rhs: &Series) -> Series {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for &Series {
    type Output = Series;

    fn mul(self, rhs: &Series) -> Series {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Mul<f64> for &Series {
    type Output = Series;

    fn mul(self, rhs: f64) -> Series {
        self.scale(rhs)
    }
}

impl Neg for &Series {
    type Output = Series;

    fn neg(self) -> Series {
        self.map(|v| -v)
    }
}
