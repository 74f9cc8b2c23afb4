//! Small dense tensor algebra on [`CoefValue`]s.

use homogen_core::value::ShapeError;
use homogen_core::{CoefValue, TermError};

fn incompatible(a: &CoefValue, b: &CoefValue) -> TermError {
    TermError::Shape(ShapeError::Incompatible {
        left: a.shape().to_vec(),
        right: b.shape().to_vec(),
    })
}

fn matrix_dims(value: &CoefValue) -> Option<(usize, usize)> {
    match value.shape() {
        [rows, cols] => Some((*rows, *cols)),
        _ => None,
    }
}

/// Contraction over the last axis of `a` and the first axis of `b`.
///
/// Scalars scale the other operand; vector-vector gives a scalar,
/// matrix-vector and vector-matrix give vectors, matrix-matrix a matrix.
pub fn dot(a: &CoefValue, b: &CoefValue) -> Result<CoefValue, TermError> {
    if a.ndim() == 0 || b.ndim() == 0 {
        return Ok(a.zip_with(b, |x, y| x * y)?);
    }
    if a.ndim() > 2 || b.ndim() > 2 {
        return Err(incompatible(a, b));
    }

    let inner = *a.shape().last().unwrap_or(&0);
    if inner != b.shape()[0] {
        return Err(incompatible(a, b));
    }
    let rows = if a.ndim() == 2 { a.shape()[0] } else { 1 };
    let cols = if b.ndim() == 2 { b.shape()[1] } else { 1 };

    let (ad, bd) = (a.data(), b.data());
    let mut out = vec![0.0; rows * cols];
    for i in 0..rows {
        for j in 0..cols {
            out[i * cols + j] = (0..inner).map(|k| ad[i * inner + k] * bd[k * cols + j]).sum();
        }
    }

    let shape = match (a.ndim(), b.ndim()) {
        (1, 1) => vec![],
        (2, 1) => vec![rows],
        (1, 2) => vec![cols],
        _ => vec![rows, cols],
    };
    Ok(CoefValue::tensor(shape, out)?)
}

/// Tensor product; the result shape is `a.shape ++ b.shape`.
pub fn outer(a: &CoefValue, b: &CoefValue) -> Result<CoefValue, TermError> {
    let mut shape = a.shape().to_vec();
    shape.extend_from_slice(b.shape());
    let data = a
        .data()
        .iter()
        .flat_map(|&x| b.data().iter().map(move |&y| x * y))
        .collect();
    Ok(CoefValue::tensor(shape, data)?)
}

pub fn transpose(a: &CoefValue) -> Result<CoefValue, TermError> {
    let Some((rows, cols)) = matrix_dims(a) else {
        if a.ndim() <= 1 {
            return Ok(a.clone());
        }
        return Err(TermError::unsupported(format!(
            "transpose() needs a matrix, got shape {:?}",
            a.shape()
        )));
    };
    let data = a.data();
    let mut out = Vec::with_capacity(data.len());
    for j in 0..cols {
        for i in 0..rows {
            out.push(data[i * cols + j]);
        }
    }
    Ok(CoefValue::tensor(vec![cols, rows], out)?)
}

fn square(a: &CoefValue, function: &str) -> Result<usize, TermError> {
    match matrix_dims(a) {
        Some((rows, cols)) if rows == cols => Ok(rows),
        _ => Err(TermError::unsupported(format!(
            "{}() needs a square matrix, got shape {:?}",
            function,
            a.shape()
        ))),
    }
}

pub fn trace(a: &CoefValue) -> Result<CoefValue, TermError> {
    let n = square(a, "trace")?;
    let data = a.data();
    Ok(CoefValue::scalar((0..n).map(|i| data[i * n + i]).sum()))
}

/// Symmetric part `(a + a^T) / 2`.
pub fn sym(a: &CoefValue) -> Result<CoefValue, TermError> {
    square(a, "sym")?;
    let t = transpose(a)?;
    Ok(a.zip_with(&t, |x, y| 0.5 * (x + y))?)
}

/// Euclidean (Frobenius) norm.
pub fn norm(a: &CoefValue) -> CoefValue {
    CoefValue::scalar(a.data().iter().map(|x| x * x).sum::<f64>().sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn m(rows: &[Vec<f64>]) -> CoefValue {
        CoefValue::from_rows(rows).unwrap()
    }

    #[test]
    fn dot_products() {
        let v = CoefValue::vector(vec![1.0, 2.0]);
        let a = m(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(dot(&v, &v).unwrap(), CoefValue::scalar(5.0));
        assert_eq!(dot(&a, &v).unwrap(), CoefValue::vector(vec![5.0, 11.0]));
        assert_eq!(dot(&v, &a).unwrap(), CoefValue::vector(vec![7.0, 10.0]));
        assert_eq!(
            dot(&a, &a).unwrap(),
            m(&[vec![7.0, 10.0], vec![15.0, 22.0]])
        );
        assert_eq!(
            dot(&CoefValue::scalar(2.0), &v).unwrap(),
            CoefValue::vector(vec![2.0, 4.0])
        );
    }

    #[test]
    fn dot_rejects_mismatch() {
        let v = CoefValue::vector(vec![1.0, 2.0, 3.0]);
        let a = m(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(dot(&a, &v).is_err());
    }

    #[test]
    fn outer_builds_matrix() {
        let a = CoefValue::vector(vec![1.0, 2.0]);
        let b = CoefValue::vector(vec![3.0, 4.0, 5.0]);
        let o = outer(&a, &b).unwrap();
        assert_eq!(o.shape(), &[2, 3]);
        assert_eq!(o.data(), &[3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn transpose_trace_sym() {
        let a = m(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(
            transpose(&a).unwrap(),
            m(&[vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]])
        );
        assert!(trace(&a).is_err());

        let s = m(&[vec![1.0, 2.0], vec![4.0, 3.0]]);
        assert_eq!(trace(&s).unwrap(), CoefValue::scalar(4.0));
        assert_eq!(sym(&s).unwrap(), m(&[vec![1.0, 3.0], vec![3.0, 3.0]]));
    }

    #[test]
    fn norm_of_vector() {
        assert_eq!(
            norm(&CoefValue::vector(vec![3.0, 4.0])),
            CoefValue::scalar(5.0)
        );
    }
}
