//! Conversions between ndarray and nalgebra.
//!
//! Data moves through the crate as ndarray arrays; the dense linear algebra
//! of the solver (Cholesky, LU, pseudo-inverse) is done with nalgebra.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Convert an ndarray Array2 to a nalgebra DMatrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// Convert an ndarray Array1 to a nalgebra DVector.
pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(arr.len(), arr.iter().copied())
}

/// Convert a nalgebra DVector to an ndarray Array1.
pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Array1<f64> {
    vec.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_matrix_layout_is_preserved() {
        let arr = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let mat = ndarray_to_nalgebra(&arr);
        assert_eq!((mat.nrows(), mat.ncols()), (2, 3));
        assert_eq!(mat[(1, 0)], 4.0);
        assert_eq!(mat[(0, 2)], 3.0);
        assert_eq!(nalgebra_to_ndarray(&mat), arr);
    }

    #[test]
    fn test_vector_conversion() {
        let v = array![1.0, -2.0, 0.5];
        let dv = ndarray_vec_to_nalgebra(&v);
        assert_eq!(dv.len(), 3);
        assert_eq!(nalgebra_vec_to_ndarray(&dv), v);
    }
}
