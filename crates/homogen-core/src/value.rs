//! Numeric result values: scalars, vectors and dense tensors.
//!
//! A [`CoefValue`] is what every mini-app produces and what the coefficient
//! aggregate stores. Arrays are kept flat in row-major order next to their
//! shape, so a 3x3 tensor is `shape = [3, 3]` with nine entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::display_number;

/// Coarse classification of a value by its number of dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Scalar,
    Vector,
    Tensor,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Tensor => "tensor",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised when data and shape disagree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("data length {len} does not match shape {shape:?}")]
    LengthMismatch { shape: Vec<usize>, len: usize },

    #[error("incompatible shapes {left:?} and {right:?}")]
    Incompatible { left: Vec<usize>, right: Vec<usize> },

    #[error("ragged rows: expected {expected} columns, found {found}")]
    Ragged { expected: usize, found: usize },
}

/// The result of a single mini-app evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoefValue {
    Scalar(f64),
    Array { shape: Vec<usize>, data: Vec<f64> },
}

impl CoefValue {
    pub fn scalar(value: f64) -> Self {
        Self::Scalar(value)
    }

    pub fn vector(data: Vec<f64>) -> Self {
        Self::Array {
            shape: vec![data.len()],
            data,
        }
    }

    /// Build a value of arbitrary shape. An empty shape yields a scalar.
    pub fn tensor(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, ShapeError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError::LengthMismatch {
                shape,
                len: data.len(),
            });
        }
        if shape.is_empty() {
            return Ok(Self::Scalar(data[0]));
        }
        Ok(Self::Array { shape, data })
    }

    /// Build a matrix from its rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ShapeError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(ShapeError::Ragged {
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self::Array {
            shape: vec![rows.len(), cols],
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Scalar(_) => &[],
            Self::Array { shape, .. } => shape,
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn kind(&self) -> ValueKind {
        match self.ndim() {
            0 => ValueKind::Scalar,
            1 => ValueKind::Vector,
            _ => ValueKind::Tensor,
        }
    }

    /// Flat row-major view of the entries.
    pub fn data(&self) -> &[f64] {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::Array { data, .. } => data,
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Array { .. } => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data().iter().all(|v| v.is_finite())
    }

    /// Apply `f` to every entry, keeping the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(v) => Self::Scalar(f(*v)),
            Self::Array { shape, data } => Self::Array {
                shape: shape.clone(),
                data: data.iter().map(|&v| f(v)).collect(),
            },
        }
    }

    /// Combine two values entry by entry. A scalar on either side is
    /// broadcast against the other operand.
    pub fn zip_with(
        &self,
        other: &CoefValue,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, ShapeError> {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Ok(Self::Scalar(f(*a, *b))),
            (Self::Scalar(a), rhs) => Ok(rhs.map(|b| f(*a, b))),
            (lhs, Self::Scalar(b)) => Ok(lhs.map(|a| f(a, *b))),
            (lhs, rhs) => {
                if lhs.shape() != rhs.shape() {
                    return Err(ShapeError::Incompatible {
                        left: lhs.shape().to_vec(),
                        right: rhs.shape().to_vec(),
                    });
                }
                Ok(Self::Array {
                    shape: lhs.shape().to_vec(),
                    data: lhs
                        .data()
                        .iter()
                        .zip(rhs.data())
                        .map(|(&a, &b)| f(a, b))
                        .collect(),
                })
            }
        }
    }

    /// Rows along the last axis. Scalars and vectors yield a single row.
    pub fn rows(&self) -> std::slice::Chunks<'_, f64> {
        let width = self.shape().last().copied().unwrap_or(1).max(1);
        self.data().chunks(width)
    }

    /// Render with a fixed number of decimals, or Rust's shortest
    /// round-trip representation when `precision` is `None`.
    pub fn render(&self, precision: Option<usize>) -> String {
        match self {
            Self::Scalar(v) => display_number(*v, precision),
            Self::Array { shape, data } => {
                let mut out = String::new();
                write_nested(&mut out, shape, data, 0, precision);
                out
            }
        }
    }
}

impl From<f64> for CoefValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl fmt::Display for CoefValue {
    /// Honors the formatter precision: `format!("{:.3}", value)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(f.precision()))
    }
}

fn write_nested(
    out: &mut String,
    shape: &[usize],
    data: &[f64],
    depth: usize,
    precision: Option<usize>,
) {
    out.push('[');
    if shape.len() <= 1 {
        let items: Vec<String> = data
            .iter()
            .map(|&v| display_number(v, precision))
            .collect();
        out.push_str(&items.join(", "));
    } else if shape[0] > 0 {
        let stride = (data.len() / shape[0]).max(1);
        for (i, chunk) in data.chunks(stride).enumerate() {
            if i > 0 {
                out.push_str(",\n");
                out.push_str(&" ".repeat(depth + 1));
            }
            write_nested(out, &shape[1..], chunk, depth + 1, precision);
        }
    }
    out.push(']');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tensor_checks_length() {
        let err = CoefValue::tensor(vec![2, 2], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::LengthMismatch {
                shape: vec![2, 2],
                len: 3
            }
        );
    }

    #[test]
    fn empty_shape_is_scalar() {
        let v = CoefValue::tensor(vec![], vec![4.5]).unwrap();
        assert_eq!(v, CoefValue::Scalar(4.5));
        assert_eq!(v.kind(), ValueKind::Scalar);
    }

    #[test]
    fn kinds_follow_dimensions() {
        assert_eq!(CoefValue::vector(vec![1.0, 2.0]).kind(), ValueKind::Vector);
        let m = CoefValue::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(m.kind(), ValueKind::Tensor);
        assert_eq!(m.shape(), &[2, 2]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = CoefValue::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, ShapeError::Ragged { expected: 2, found: 1 }));
    }

    #[test]
    fn zip_broadcasts_scalars() {
        let v = CoefValue::vector(vec![1.0, 2.0]);
        let scaled = CoefValue::Scalar(3.0).zip_with(&v, |a, b| a * b).unwrap();
        assert_eq!(scaled, CoefValue::vector(vec![3.0, 6.0]));
    }

    #[test]
    fn zip_rejects_mismatched_arrays() {
        let a = CoefValue::vector(vec![1.0, 2.0]);
        let b = CoefValue::vector(vec![1.0, 2.0, 3.0]);
        assert!(a.zip_with(&b, |x, y| x + y).is_err());
    }

    #[test]
    fn display_with_precision() {
        let m = CoefValue::from_rows(&[vec![1.0, 0.25], vec![0.0, 2.0]]).unwrap();
        assert_eq!(format!("{:.2}", m), "[[1.00, 0.25],\n [0.00, 2.00]]");
        assert_eq!(format!("{:.3}", CoefValue::Scalar(0.5)), "0.500");
        assert_eq!(format!("{}", CoefValue::vector(vec![1.5, 2.0])), "[1.5, 2]");
    }

    #[test]
    fn rows_of_matrix() {
        let m = CoefValue::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let rows: Vec<&[f64]> = m.rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
    }

    #[test]
    fn serde_keeps_shape() {
        let m = CoefValue::tensor(vec![2, 1, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: CoefValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
