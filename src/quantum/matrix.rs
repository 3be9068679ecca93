//! Dense complex matrices
//!
//! Every gate, projector and state vector in the engine is a [`Matrix`]. State
//! vectors are column vectors (`n x 1`). Operations never mutate their inputs.

use std::fmt;
use ndarray::Array2;
use num_complex::Complex64;

use super::error::QuantumError;

/// Shorthand for a real-valued complex scalar
pub fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Array2<Complex64>,
}

impl Matrix {
    /// Build a matrix from its rows. All rows must have the same length.
    pub fn create(rows: Vec<Vec<Complex64>>) -> Result<Self, QuantumError> {
        let row_count = rows.len();
        let col_count = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut flat = Vec::with_capacity(row_count * col_count);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != col_count {
                return Err(QuantumError::RaggedRows {
                    row: i,
                    expected: col_count,
                    got: row.len(),
                });
            }
            flat.extend(row);
        }

        let data = Array2::from_shape_vec((row_count, col_count), flat).map_err(|_| {
            QuantumError::RaggedRows { row: 0, expected: col_count, got: 0 }
        })?;

        Ok(Matrix { data })
    }

    /// Same as [`Matrix::create`] for matrices with real entries
    pub fn from_real(rows: &[&[f64]]) -> Result<Self, QuantumError> {
        Self::create(
            rows.iter()
                .map(|row| row.iter().map(|&v| real(v)).collect())
                .collect(),
        )
    }

    pub fn from_array(data: Array2<Complex64>) -> Self {
        Matrix { data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix { data: Array2::zeros((rows, cols)) }
    }

    pub fn identity(size: usize) -> Self {
        Matrix { data: Array2::eye(size) }
    }

    /// An `n x 1` matrix
    pub fn column_vector(values: &[Complex64]) -> Self {
        let data = Array2::from_shape_fn((values.len(), 1), |(i, _)| values[i]);
        Matrix { data }
    }

    /// A `1 x n` matrix
    pub fn row_vector(values: &[Complex64]) -> Self {
        let data = Array2::from_shape_fn((1, values.len()), |(_, j)| values[j]);
        Matrix { data }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[[row, col]]
    }

    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }

    pub fn is_column_vector(&self) -> bool {
        self.cols() == 1
    }

    /// Matrix product `self · other`
    pub fn dot(&self, other: &Matrix) -> Result<Matrix, QuantumError> {
        if self.cols() != other.rows() {
            return Err(self.shape_error(other));
        }
        Ok(Matrix { data: self.data.dot(&other.data) })
    }

    /// Element-wise sum
    pub fn add(&self, other: &Matrix) -> Result<Matrix, QuantumError> {
        if self.shape() != other.shape() {
            return Err(self.shape_error(other));
        }
        Ok(Matrix { data: &self.data + &other.data })
    }

    pub fn scale(&self, factor: Complex64) -> Matrix {
        Matrix { data: self.data.mapv(|v| v * factor) }
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Matrix {
        Matrix { data: self.data.t().mapv(|v| v.conj()) }
    }

    /// Outer product `v · v†` of a column vector with itself
    pub fn projection(&self) -> Matrix {
        Matrix { data: self.data.dot(&self.adjoint().data) }
    }

    /// Kronecker product `self ⊗ other`
    pub fn kron(&self, other: &Matrix) -> Matrix {
        let (n1, m1) = self.shape();
        let (n2, m2) = other.shape();

        let mut result = Array2::zeros((n1 * n2, m1 * m2));

        for i in 0..n1 {
            for j in 0..m1 {
                let a = self.data[[i, j]];
                if a == Complex64::new(0.0, 0.0) {
                    continue;
                }
                for k in 0..n2 {
                    for l in 0..m2 {
                        result[[i * n2 + k, j * m2 + l]] = a * other.data[[k, l]];
                    }
                }
            }
        }

        Matrix { data: result }
    }

    /// Squared modulus of every entry of a column vector, in index order
    pub fn weights(&self) -> Vec<f64> {
        self.data.iter().map(|amp| amp.norm_sqr()).collect()
    }

    /// Entries of a column vector, in index order
    pub fn amplitudes(&self) -> Vec<Complex64> {
        self.data.iter().copied().collect()
    }

    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self.data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).norm() < epsilon)
    }

    fn shape_error(&self, other: &Matrix) -> QuantumError {
        QuantumError::Shape {
            left_rows: self.rows(),
            left_cols: self.cols(),
            right_rows: other.rows(),
            right_cols: other.cols(),
        }
    }
}

/// Left-folded Kronecker product: `tensor([A, B, C]) = (A ⊗ B) ⊗ C`.
///
/// The empty product is the `1 x 1` identity.
pub fn tensor<'a, I>(matrices: I) -> Matrix
where
    I: IntoIterator<Item = &'a Matrix>,
{
    matrices
        .into_iter()
        .fold(Matrix::identity(1), |acc, m| acc.kron(m))
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|v| format!("{:.4}{:+.4}i", v.re, v.im))
                .collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}
