use crate::Value;
use std::fmt;

/// Dense n-dimensional array of values, row-major layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub data: Vec<Value>,
    pub shape: Vec<usize>,
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Advance a multi-index in row-major order; false once all positions
/// have been visited.
fn next_index(ix: &mut [usize], extents: &[usize]) -> bool {
    for dim in (0..ix.len()).rev() {
        ix[dim] += 1;
        if ix[dim] < extents[dim] {
            return true;
        }
        ix[dim] = 0;
    }
    false
}

impl Matrix {
    pub fn new(data: Vec<Value>, shape: Vec<usize>) -> Result<Self, String> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(format!(
                "Matrix data length {} doesn't match shape {:?} ({} elements)",
                data.len(),
                shape,
                expected
            ));
        }
        Ok(Matrix { data, shape })
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Matrix {
            data: vec![Value::Num(0.0); size],
            shape,
        }
    }

    pub fn from_rows(rows: Vec<Vec<Value>>) -> Result<Self, String> {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        for row in &rows {
            if row.len() != ncols {
                return Err(format!(
                    "Column dimensions mismatch ({} != {})",
                    row.len(),
                    ncols
                ));
            }
        }
        let data = rows.into_iter().flatten().collect();
        Matrix::new(data, vec![nrows, ncols])
    }

    pub fn size(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn linear_index(&self, indices: &[usize]) -> Result<usize, String> {
        if indices.len() != self.shape.len() {
            return Err(format!(
                "Dimension mismatch ({} != {})",
                indices.len(),
                self.shape.len()
            ));
        }
        let strides = strides(&self.shape);
        let mut lin = 0;
        for (dim, (&ix, &extent)) in indices.iter().zip(self.shape.iter()).enumerate() {
            if ix >= extent {
                // reported 1-based by callers
                return Err(format!(
                    "Index out of range ({} > {}) in dimension {}",
                    ix + 1,
                    extent,
                    dim
                ));
            }
            lin += ix * strides[dim];
        }
        Ok(lin)
    }

    /// Element at 0-based `indices`; one index per dimension.
    pub fn get(&self, indices: &[usize]) -> Result<&Value, String> {
        let lin = self.linear_index(indices)?;
        Ok(&self.data[lin])
    }

    /// Replace the element at 0-based `indices`, growing the matrix with
    /// zeros when an index lies beyond the current extent.
    pub fn set(&mut self, indices: &[usize], value: Value) -> Result<(), String> {
        if indices.len() != self.shape.len() {
            return Err(format!(
                "Dimension mismatch ({} != {})",
                indices.len(),
                self.shape.len()
            ));
        }
        if indices.iter().zip(self.shape.iter()).any(|(&i, &e)| i >= e) {
            let new_shape: Vec<usize> = indices
                .iter()
                .zip(self.shape.iter())
                .map(|(&i, &e)| e.max(i + 1))
                .collect();
            self.resize(new_shape);
        }
        let lin = self.linear_index(indices)?;
        self.data[lin] = value;
        Ok(())
    }

    /// Grow or shrink to `new_shape`, preserving overlapping elements and
    /// filling new positions with zero.
    pub fn resize(&mut self, new_shape: Vec<usize>) {
        if new_shape == self.shape {
            return;
        }
        let mut grown = Matrix::zeros(new_shape);
        let overlap: Vec<usize> = grown
            .shape
            .iter()
            .zip(self.shape.iter())
            .map(|(&a, &b)| a.min(b))
            .collect();
        if !overlap.is_empty() && !overlap.iter().any(|&d| d == 0) {
            let mut ix = vec![0usize; overlap.len()];
            loop {
                let v = self.get(&ix).cloned().unwrap_or(Value::Num(0.0));
                let _ = grown.set(&ix, v);
                if !next_index(&mut ix, &overlap) {
                    break;
                }
            }
        }
        *self = grown;
    }

    /// Select a sub-block: `selection` holds, per dimension, the 0-based
    /// indices to keep, in order.
    pub fn submatrix(&self, selection: &[Vec<usize>]) -> Result<Matrix, String> {
        if selection.len() != self.shape.len() {
            return Err(format!(
                "Dimension mismatch ({} != {})",
                selection.len(),
                self.shape.len()
            ));
        }
        let out_shape: Vec<usize> = selection.iter().map(|s| s.len()).collect();
        let total: usize = out_shape.iter().product();
        let mut data = Vec::with_capacity(total);
        if total > 0 {
            let mut ix = vec![0usize; selection.len()];
            loop {
                let src: Vec<usize> = ix
                    .iter()
                    .zip(selection.iter())
                    .map(|(&i, sel)| sel[i])
                    .collect();
                data.push(self.get(&src)?.clone());
                if !next_index(&mut ix, &out_shape) {
                    break;
                }
            }
        }
        Matrix::new(data, out_shape)
    }

    /// Write `replacement` into the block addressed by `selection`. The
    /// matrix grows as needed to fit the largest index of each dimension.
    pub fn set_submatrix(&mut self, selection: &[Vec<usize>], replacement: &Matrix) -> Result<(), String> {
        let out_shape: Vec<usize> = selection.iter().map(|s| s.len()).collect();
        if out_shape != replacement.shape
            && !(replacement.len() == 1 && out_shape.iter().product::<usize>() >= 1)
        {
            return Err(format!(
                "Dimension mismatch ({:?} != {:?})",
                replacement.shape, out_shape
            ));
        }
        let total: usize = out_shape.iter().product();
        let mut ix = vec![0usize; selection.len()];
        for n in 0..total {
            let dst: Vec<usize> = ix
                .iter()
                .zip(selection.iter())
                .map(|(&i, sel)| sel[i])
                .collect();
            let v = if replacement.len() == 1 {
                replacement.data[0].clone()
            } else {
                replacement.data[n].clone()
            };
            self.set(&dst, v)?;
            next_index(&mut ix, &out_shape);
        }
        Ok(())
    }

    /// Apply `f` to every element, producing a matrix of the same shape.
    pub fn map_elements<F>(&self, mut f: F) -> Result<Matrix, String>
    where
        F: FnMut(&Value) -> Result<Value, String>,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for v in &self.data {
            data.push(f(v)?);
        }
        Matrix::new(data, self.shape.clone())
    }

    /// Zip two equally-shaped matrices elementwise.
    pub fn zip_elements<F>(&self, other: &Matrix, mut f: F) -> Result<Matrix, String>
    where
        F: FnMut(&Value, &Value) -> Result<Value, String>,
    {
        if self.shape != other.shape {
            return Err(format!(
                "Dimension mismatch ({:?} != {:?})",
                self.shape, other.shape
            ));
        }
        let mut data = Vec::with_capacity(self.data.len());
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            data.push(f(a, b)?);
        }
        Matrix::new(data, self.shape.clone())
    }
}

fn fmt_slice(f: &mut fmt::Formatter<'_>, m: &Matrix, dim: usize, offset: usize) -> fmt::Result {
    if m.shape.is_empty() {
        return write!(f, "[]");
    }
    let strides = strides(&m.shape);
    write!(f, "[")?;
    for i in 0..m.shape[dim] {
        if i > 0 {
            write!(f, ", ")?;
        }
        let pos = offset + i * strides[dim];
        if dim + 1 == m.shape.len() {
            write!(f, "{}", m.data[pos])?;
        } else {
            fmt_slice(f, m, dim + 1, pos)?;
        }
    }
    write!(f, "]")
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_slice(f, self, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> Value {
        Value::Num(v)
    }

    #[test]
    fn construction_validates_shape() {
        assert!(Matrix::new(vec![n(1.0), n(2.0)], vec![2]).is_ok());
        assert!(Matrix::new(vec![n(1.0)], vec![2]).is_err());
    }

    #[test]
    fn get_and_set() {
        let mut m = Matrix::from_rows(vec![vec![n(1.0), n(2.0)], vec![n(3.0), n(4.0)]]).unwrap();
        assert_eq!(m.get(&[0, 0]).unwrap(), &n(1.0));
        assert_eq!(m.get(&[1, 1]).unwrap(), &n(4.0));
        m.set(&[0, 1], n(9.0)).unwrap();
        assert_eq!(m.get(&[0, 1]).unwrap(), &n(9.0));
    }

    #[test]
    fn set_grows_with_zero_fill() {
        let mut m = Matrix::new(vec![n(1.0), n(2.0)], vec![2]).unwrap();
        m.set(&[4], n(5.0)).unwrap();
        assert_eq!(m.shape, vec![5]);
        assert_eq!(m.get(&[2]).unwrap(), &n(0.0));
        assert_eq!(m.get(&[4]).unwrap(), &n(5.0));
    }

    #[test]
    fn out_of_range_get_reports_one_based() {
        let m = Matrix::new(vec![n(1.0), n(2.0)], vec![2]).unwrap();
        let err = m.get(&[2]).unwrap_err();
        assert!(err.contains("Index out of range (3 > 2)"), "{err}");
    }

    #[test]
    fn submatrix_selection() {
        let m = Matrix::from_rows(vec![
            vec![n(1.0), n(2.0), n(3.0)],
            vec![n(4.0), n(5.0), n(6.0)],
        ])
        .unwrap();
        let sub = m.submatrix(&[vec![0, 1], vec![1]]).unwrap();
        assert_eq!(sub.shape, vec![2, 1]);
        assert_eq!(sub.data, vec![n(2.0), n(5.0)]);
    }

    #[test]
    fn set_submatrix_with_scalar_broadcast() {
        let mut m = Matrix::zeros(vec![2, 2]);
        let scalar = Matrix::new(vec![n(7.0)], vec![1]).unwrap();
        m.set_submatrix(&[vec![0, 1], vec![0]], &scalar).unwrap();
        assert_eq!(m.get(&[0, 0]).unwrap(), &n(7.0));
        assert_eq!(m.get(&[1, 0]).unwrap(), &n(7.0));
        assert_eq!(m.get(&[0, 1]).unwrap(), &n(0.0));
    }

    #[test]
    fn display_nested() {
        let m = Matrix::from_rows(vec![vec![n(1.0), n(2.0)], vec![n(3.0), n(4.0)]]).unwrap();
        assert_eq!(m.to_string(), "[[1, 2], [3, 4]]");
    }
}
