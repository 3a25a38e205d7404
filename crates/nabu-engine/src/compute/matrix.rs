use std::fmt;

use anyhow::{ensure, Result};

/// Row-major `f32` matrix.
///
/// On the GPU a matrix is a flat `f32` array: the header pair `(rows, cols)`
/// followed by `rows * cols` numbers. See [`Matrix::encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: u32,
    cols: u32,
    numbers: Vec<f32>,
}

/// Number of `f32` slots taken by the `(rows, cols)` header.
pub const HEADER_LEN: usize = 2;

impl Matrix {
    /// Creates a matrix from row-major `numbers`.
    pub fn new(rows: u32, cols: u32, numbers: Vec<f32>) -> Result<Self> {
        ensure!(rows > 0 && cols > 0, "matrix must have at least one row and column, got {rows}x{cols}");
        ensure!(
            numbers.len() == rows as usize * cols as usize,
            "{rows}x{cols} matrix needs {} numbers, got {}",
            rows as usize * cols as usize,
            numbers.len()
        );
        Ok(Self { rows, cols, numbers })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn numbers(&self) -> &[f32] {
        &self.numbers
    }

    /// Element at `(row, col)`, or `None` outside the matrix.
    pub fn get(&self, row: u32, col: u32) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.numbers.get((row * self.cols + col) as usize).copied()
    }

    /// Shader layout: `[rows, cols, numbers...]`.
    pub fn encode(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.numbers.len());
        out.push(self.rows as f32);
        out.push(self.cols as f32);
        out.extend_from_slice(&self.numbers);
        out
    }

    /// Parses the shader layout produced by [`encode`](Self::encode).
    ///
    /// Extra trailing values (buffer padding) are ignored.
    pub fn decode(data: &[f32]) -> Result<Self> {
        ensure!(data.len() >= HEADER_LEN, "matrix data is missing its header");
        let rows = header_dim(data[0])?;
        let cols = header_dim(data[1])?;
        let len = rows as usize * cols as usize;
        ensure!(
            data.len() >= HEADER_LEN + len,
            "{rows}x{cols} matrix needs {len} numbers, got {}",
            data.len() - HEADER_LEN
        );
        Self::new(rows, cols, data[HEADER_LEN..HEADER_LEN + len].to_vec())
    }

    /// Size in bytes of the encoded matrix.
    pub fn byte_len(&self) -> u64 {
        encoded_byte_len(self.rows, self.cols)
    }

    /// Size in bytes of the encoded product `a * b`.
    pub fn product_byte_len(a: &Matrix, b: &Matrix) -> u64 {
        encoded_byte_len(a.rows, b.cols)
    }

    /// Checks that `self * other` is defined.
    pub fn check_product(&self, other: &Matrix) -> Result<()> {
        ensure!(
            self.cols == other.rows,
            "cannot multiply {}x{} by {}x{}: inner dimensions differ",
            self.rows,
            self.cols,
            other.rows,
            other.cols
        );
        Ok(())
    }

    /// Reference product computed on the host.
    pub fn multiply_cpu(&self, other: &Matrix) -> Result<Matrix> {
        self.check_product(other)?;

        let mut numbers = Vec::with_capacity(self.rows as usize * other.cols as usize);
        for row in 0..self.rows {
            for col in 0..other.cols {
                let cell: f32 = (0..self.cols)
                    .map(|i| self.at(row, i) * other.at(i, col))
                    .sum();
                numbers.push(cell);
            }
        }
        Matrix::new(self.rows, other.cols, numbers)
    }

    fn at(&self, row: u32, col: u32) -> f32 {
        self.numbers[row as usize * self.cols as usize + col as usize]
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Matrix, epsilon: f32) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .numbers
                .iter()
                .zip(&other.numbers)
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

fn encoded_byte_len(rows: u32, cols: u32) -> u64 {
    std::mem::size_of::<f32>() as u64 * (HEADER_LEN as u64 + u64::from(rows) * u64::from(cols))
}

fn header_dim(value: f32) -> Result<u32> {
    ensure!(
        value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f32,
        "invalid matrix dimension {value}"
    );
    Ok(value as u32)
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}x{}", self.rows, self.cols)?;
        for row in self.numbers.chunks(self.cols as usize) {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>8.2}")).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: u32, cols: u32, numbers: &[f32]) -> Matrix {
        Matrix::new(rows, cols, numbers.to_vec()).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_rejects_wrong_length() {
        assert!(Matrix::new(2, 2, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn new_rejects_empty_dimension() {
        assert!(Matrix::new(0, 2, vec![]).is_err());
        assert!(Matrix::new(2, 0, vec![]).is_err());
    }

    // ── encoding ──────────────────────────────────────────────────────────

    #[test]
    fn encode_prefixes_header_pair() {
        let a = m(2, 4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(
            a.encode(),
            vec![2.0, 4.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
        assert_eq!(a.byte_len(), 40);
    }

    #[test]
    fn decode_ignores_trailing_padding() {
        let decoded = Matrix::decode(&[1.0, 2.0, 5.0, 6.0, 0.0, 0.0]).unwrap();
        assert_eq!(decoded, m(1, 2, &[5.0, 6.0]));
    }

    #[test]
    fn decode_rejects_bad_header() {
        assert!(Matrix::decode(&[2.0]).is_err());
        assert!(Matrix::decode(&[1.5, 1.0, 0.0]).is_err());
        assert!(Matrix::decode(&[-1.0, 1.0, 0.0]).is_err());
        assert!(Matrix::decode(&[f32::NAN, 1.0, 0.0]).is_err());
    }

    #[test]
    fn decode_rejects_short_body() {
        assert!(Matrix::decode(&[2.0, 2.0, 1.0, 2.0, 3.0]).is_err());
    }

    // ── product ───────────────────────────────────────────────────────────

    #[test]
    fn product_of_default_inputs() {
        let a = m(2, 4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let b = m(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let c = a.multiply_cpu(&b).unwrap();
        assert_eq!(c, m(2, 2, &[50.0, 60.0, 114.0, 140.0]));
        assert_eq!(Matrix::product_byte_len(&a, &b), 24);
    }

    #[test]
    fn product_with_identity() {
        let a = m(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let id = m(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(a.multiply_cpu(&id).unwrap(), a);
    }

    #[test]
    fn product_rejects_mismatched_inner_dimension() {
        let a = m(2, 3, &[0.0; 6]);
        let b = m(2, 3, &[0.0; 6]);
        assert!(a.check_product(&b).is_err());
        assert!(a.multiply_cpu(&b).is_err());
    }

    #[test]
    fn get_is_row_major_and_bounded() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.get(0, 2), Some(3.0));
        assert_eq!(a.get(1, 0), Some(4.0));
        assert_eq!(a.get(2, 0), None);
        assert_eq!(a.get(0, 3), None);
    }

    #[test]
    fn approx_eq_tolerates_rounding() {
        let a = m(1, 2, &[1.0, 2.0]);
        let b = m(1, 2, &[1.0 + 1e-6, 2.0]);
        assert!(a.approx_eq(&b, 1e-4));
        assert!(!a.approx_eq(&m(2, 1, &[1.0, 2.0]), 1e-4));
    }
}
