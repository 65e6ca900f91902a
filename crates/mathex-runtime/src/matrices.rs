//! Matrix builtins: elementwise broadcasting, matrix product, transpose.

use crate::arithmetic::{scalar_add, scalar_divide, scalar_multiply, scalar_pow, scalar_subtract};
use mathex_builtins::{Builtin, Matrix, Value};

type ScalarOp = fn(&Value, &Value) -> Result<Value, String>;

pub fn map_matrix<F>(v: &Value, f: F) -> Result<Value, String>
where
    F: FnMut(&Value) -> Result<Value, String>,
{
    match v {
        Value::Matrix(m) => Ok(Value::Matrix(m.map_elements(f)?)),
        other => Err(format!("expected Matrix, got {}", other.type_name())),
    }
}

/// Elementwise application with scalar broadcasting on either side.
pub fn broadcast(a: &Value, b: &Value, op: ScalarOp) -> Result<Value, String> {
    match (a, b) {
        (Value::Matrix(ma), Value::Matrix(mb)) => {
            Ok(Value::Matrix(ma.zip_elements(mb, |x, y| op(x, y))?))
        }
        (Value::Matrix(ma), scalar) => Ok(Value::Matrix(ma.map_elements(|x| op(x, scalar))?)),
        (scalar, Value::Matrix(mb)) => Ok(Value::Matrix(mb.map_elements(|y| op(scalar, y))?)),
        (x, y) => op(x, y),
    }
}

fn shape2(m: &Matrix) -> (usize, usize) {
    match m.shape.len() {
        1 => (1, m.shape[0]),
        2 => (m.shape[0], m.shape[1]),
        _ => (0, 0),
    }
}

/// True matrix product for 1-D and 2-D operands; 1-D operands are treated
/// as row vectors on the left and column vectors on the right.
pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix, String> {
    let (ar, ac) = shape2(a);
    let (br, bc) = shape2(b);
    // a 1-D right operand acts as a column
    let (br, bc) = if b.shape.len() == 1 { (bc, br) } else { (br, bc) };
    if ac != br || ar == 0 || bc == 0 {
        return Err(format!(
            "Dimension mismatch in multiplication (A: {:?}, B: {:?})",
            a.shape, b.shape
        ));
    }
    let get_a = |r: usize, c: usize| &a.data[r * ac + c];
    let get_b = |r: usize, c: usize| &b.data[r * bc + c];
    let mut data = Vec::with_capacity(ar * bc);
    for r in 0..ar {
        for c in 0..bc {
            let mut acc = Value::Num(0.0);
            for k in 0..ac {
                let prod = scalar_multiply(get_a(r, k), get_b(k, c))?;
                acc = scalar_add(&acc, &prod)?;
            }
            data.push(acc);
        }
    }
    // vector result collapses back to 1-D
    if a.shape.len() == 1 || b.shape.len() == 1 {
        let len = ar * bc;
        if len == 1 {
            return Matrix::new(data, vec![1]);
        }
        return Matrix::new(data, vec![len]);
    }
    Matrix::new(data, vec![ar, bc])
}

fn conjugate(v: &Value) -> Result<Value, String> {
    match v {
        Value::Complex(c) => Ok(Value::Complex(c.conj())),
        other => Ok(other.clone()),
    }
}

/// Conjugate transpose. 1-D vectors transpose to themselves (conjugated).
pub fn conjugate_transpose(m: &Matrix) -> Result<Matrix, String> {
    match m.shape.len() {
        0 | 1 => m.map_elements(|v| conjugate(v)),
        2 => {
            let (rows, cols) = (m.shape[0], m.shape[1]);
            let mut data = Vec::with_capacity(m.data.len());
            for c in 0..cols {
                for r in 0..rows {
                    data.push(conjugate(&m.data[r * cols + c])?);
                }
            }
            Matrix::new(data, vec![cols, rows])
        }
        _ => Err("transpose expects a 1-D or 2-D matrix".to_string()),
    }
}

// registered entries

fn multiply_matrices(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Matrix(a), Value::Matrix(b)) => Ok(Value::Matrix(matmul(a, b)?)),
        _ => Err("expected matrices".to_string()),
    }
}

fn multiply_matrix_scalar(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_multiply)
}

fn add_broadcast(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_add)
}

fn subtract_broadcast(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_subtract)
}

fn divide_matrix_scalar(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_divide)
}

fn dot_multiply(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_multiply)
}

fn dot_divide(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_divide)
}

fn dot_pow(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_pow)
}

fn ctranspose_matrix(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Matrix(m) => Ok(Value::Matrix(conjugate_transpose(m)?)),
        _ => Err("expected Matrix".to_string()),
    }
}

fn ctranspose_scalar(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Complex(c) => Ok(Value::Complex(c.conj())),
        v => Ok(v.clone()),
    }
}

/// Shape of a value as a vector: matrices report their dimensions, strings
/// their character count, scalars an empty vector.
fn size_of(args: &[Value]) -> Result<Value, String> {
    let dims: Vec<usize> = match &args[0] {
        Value::Matrix(m) => m.shape.clone(),
        Value::Str(s) => vec![s.chars().count()],
        _ => Vec::new(),
    };
    let len = dims.len();
    Ok(Value::Matrix(Matrix::new(
        dims.into_iter().map(|d| Value::Num(d as f64)).collect(),
        vec![len],
    )?))
}

inventory::submit! { Builtin { name: "add", signature: "Matrix, Matrix", implementation: add_broadcast } }
inventory::submit! { Builtin { name: "add", signature: "Matrix, number|Complex", implementation: add_broadcast } }
inventory::submit! { Builtin { name: "add", signature: "number|Complex, Matrix", implementation: add_broadcast } }
inventory::submit! { Builtin { name: "subtract", signature: "Matrix, Matrix", implementation: subtract_broadcast } }
inventory::submit! { Builtin { name: "subtract", signature: "Matrix, number|Complex", implementation: subtract_broadcast } }
inventory::submit! { Builtin { name: "subtract", signature: "number|Complex, Matrix", implementation: subtract_broadcast } }
inventory::submit! { Builtin { name: "multiply", signature: "Matrix, Matrix", implementation: multiply_matrices } }
inventory::submit! { Builtin { name: "multiply", signature: "Matrix, number|Complex", implementation: multiply_matrix_scalar } }
inventory::submit! { Builtin { name: "multiply", signature: "number|Complex, Matrix", implementation: multiply_matrix_scalar } }
inventory::submit! { Builtin { name: "divide", signature: "Matrix, number|Complex", implementation: divide_matrix_scalar } }
inventory::submit! { Builtin { name: "dotMultiply", signature: "Matrix|number|Complex, Matrix|number|Complex", implementation: dot_multiply } }
inventory::submit! { Builtin { name: "dotDivide", signature: "Matrix|number|Complex, Matrix|number|Complex", implementation: dot_divide } }
inventory::submit! { Builtin { name: "dotPow", signature: "Matrix|number|Complex, Matrix|number|Complex", implementation: dot_pow } }
inventory::submit! { Builtin { name: "ctranspose", signature: "Matrix", implementation: ctranspose_matrix } }
inventory::submit! { Builtin { name: "ctranspose", signature: "number|Complex", implementation: ctranspose_scalar } }
inventory::submit! { Builtin { name: "size", signature: "any", implementation: size_of } }

#[cfg(test)]
mod tests {
    use super::*;
    use mathex_builtins::Complex64;

    fn n(v: f64) -> Value {
        Value::Num(v)
    }

    fn mat2(rows: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(
            rows.into_iter()
                .map(|r| r.into_iter().map(n).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn matrix_product() {
        let a = mat2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = mat2(vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        let p = matmul(&a, &b).unwrap();
        assert_eq!(
            p.data,
            vec![n(19.0), n(22.0), n(43.0), n(50.0)]
        );
    }

    #[test]
    fn matrix_vector_product() {
        let a = mat2(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let v = Matrix::new(vec![n(1.0), n(1.0)], vec![2]).unwrap();
        let p = matmul(&a, &v).unwrap();
        assert_eq!(p.shape, vec![2]);
        assert_eq!(p.data, vec![n(3.0), n(7.0)]);
    }

    #[test]
    fn mismatched_dimensions_error() {
        let a = mat2(vec![vec![1.0, 2.0]]);
        let b = mat2(vec![vec![1.0, 2.0]]);
        assert!(matmul(&a, &b).is_err());
    }

    #[test]
    fn scalar_broadcasting() {
        let m = Value::Matrix(mat2(vec![vec![1.0, 2.0]]));
        let out = broadcast(&m, &n(10.0), scalar_multiply).unwrap();
        match out {
            Value::Matrix(m) => assert_eq!(m.data, vec![n(10.0), n(20.0)]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn conjugate_transpose_swaps_and_conjugates() {
        let m = Matrix::from_rows(vec![
            vec![Value::Complex(Complex64::new(1.0, 2.0)), n(3.0)],
            vec![n(4.0), n(5.0)],
        ])
        .unwrap();
        let t = conjugate_transpose(&m).unwrap();
        assert_eq!(t.shape, vec![2, 2]);
        assert_eq!(t.data[0], Value::Complex(Complex64::new(1.0, -2.0)));
        assert_eq!(t.data[1], n(4.0));
        assert_eq!(t.data[2], n(3.0));
    }

    #[test]
    fn size_reports_shape() {
        let m = Value::Matrix(mat2(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]));
        match size_of(&[m]).unwrap() {
            Value::Matrix(s) => assert_eq!(s.data, vec![n(2.0), n(3.0)]),
            other => panic!("expected matrix, got {other:?}"),
        }
    }
}
