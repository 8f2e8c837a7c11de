//! Square matrices of quasi-polynomials with exact determinants and cofactors.
//!
//! Determinants are computed by Laplace expansion with memoisation over the set of remaining
//! columns, which is O(n 2^n) ring operations and needs no division: the entries live in a ring,
//! not a field, so Gaussian elimination is not available.
use crate::symbolic::quasi_polynomial::QuasiPoly;
use nalgebra::DMatrix;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct QuasiMatrix {
    data: Vec<Vec<QuasiPoly>>,
    pub nrows: usize,
    pub ncols: usize,
}

impl QuasiMatrix {
    pub fn zeros(nrows: usize, ncols: usize) -> QuasiMatrix {
        QuasiMatrix {
            data: vec![vec![QuasiPoly::zero(); ncols]; nrows],
            nrows,
            ncols,
        }
    }

    /// rows of equal length
    pub fn from_rows(rows: Vec<Vec<QuasiPoly>>) -> QuasiMatrix {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        debug_assert!(rows.iter().all(|r| r.len() == ncols));
        QuasiMatrix { data: rows, nrows, ncols }
    }

    pub fn get(&self, row: usize, col: usize) -> &QuasiPoly {
        &self.data[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: QuasiPoly) {
        self.data[row][col] = value;
    }

    pub fn row(&self, row: usize) -> &[QuasiPoly] {
        &self.data[row]
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// element-wise derivative
    pub fn diff(&self) -> QuasiMatrix {
        QuasiMatrix::from_rows(
            self.data
                .iter()
                .map(|row| row.iter().map(|e| e.diff()).collect())
                .collect(),
        )
    }

    /// the matrix without row `row` and column `col`
    pub fn minor(&self, row: usize, col: usize) -> QuasiMatrix {
        QuasiMatrix::from_rows(
            self.data
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != row)
                .map(|(_, r)| {
                    r.iter()
                        .enumerate()
                        .filter(|(j, _)| *j != col)
                        .map(|(_, e)| e.clone())
                        .collect()
                })
                .collect(),
        )
    }

    /// determinant of the submatrix formed by `rows` and the columns in the bitmask `cols`
    fn det_sub(&self, rows: &[usize], cols: u64, memo: &mut HashMap<u64, QuasiPoly>) -> QuasiPoly {
        if rows.is_empty() {
            return QuasiPoly::one();
        }
        if let Some(cached) = memo.get(&cols) {
            return cached.clone();
        }
        let row = rows[0];
        let mut result = QuasiPoly::zero();
        let mut position = 0;
        for col in 0..self.ncols {
            if cols & (1 << col) == 0 {
                continue;
            }
            let entry = &self.data[row][col];
            if !entry.is_zero() {
                let sub = self.det_sub(&rows[1..], cols & !(1 << col), memo);
                let product = entry * &sub;
                result = if position % 2 == 0 { &result + &product } else { &result - &product };
            }
            position += 1;
        }
        memo.insert(cols, result.clone());
        result
    }

    pub fn determinant(&self) -> QuasiPoly {
        assert!(self.is_square(), "determinant of a non-square matrix");
        if self.nrows == 0 {
            return QuasiPoly::one();
        }
        let rows: Vec<usize> = (0..self.nrows).collect();
        let all = (1u64 << self.ncols) - 1;
        self.det_sub(&rows, all, &mut HashMap::new())
    }

    /// (-1)^(row+col) * det(minor(row, col))
    pub fn cofactor(&self, row: usize, col: usize) -> QuasiPoly {
        let minor_det = self.minor(row, col).determinant();
        if (row + col) % 2 == 0 { minor_det } else { -&minor_det }
    }

    /// cofactors of one row, sharing the memo of the remaining rows
    pub fn cofactors_of_row(&self, row: usize) -> Vec<QuasiPoly> {
        let rows: Vec<usize> = (0..self.nrows).filter(|r| *r != row).collect();
        let all = (1u64 << self.ncols) - 1;
        let mut memo = HashMap::new();
        (0..self.ncols)
            .map(|col| {
                let minor_det = self.det_sub(&rows, all & !(1 << col), &mut memo);
                if (row + col) % 2 == 0 { minor_det } else { -&minor_det }
            })
            .collect()
    }

    /// determinant by expansion along the last row, reusing its cofactors
    pub fn determinant_with_last_row_cofactors(&self) -> (QuasiPoly, Vec<QuasiPoly>) {
        let last = self.nrows - 1;
        let cofactors = self.cofactors_of_row(last);
        let det = self.data[last]
            .iter()
            .zip(cofactors.iter())
            .fold(QuasiPoly::zero(), |acc, (e, c)| &acc + &(e * c));
        (det, cofactors)
    }

    /// the entries in the given rows and columns, in that order
    pub fn submatrix(&self, rows: &[usize], cols: &[usize]) -> QuasiMatrix {
        QuasiMatrix {
            data: rows
                .iter()
                .map(|r| cols.iter().map(|c| self.data[*r][*c].clone()).collect())
                .collect(),
            nrows: rows.len(),
            ncols: cols.len(),
        }
    }

    /// order of the largest minor that does not vanish identically
    pub fn rank(&self) -> usize {
        let max = self.nrows.min(self.ncols);
        (1..=max)
            .rev()
            .find(|&k| {
                index_subsets(self.nrows, k).iter().any(|rows| {
                    index_subsets(self.ncols, k)
                        .iter()
                        .any(|cols| !self.submatrix(rows, cols).determinant().is_zero())
                })
            })
            .unwrap_or(0)
    }

    /// numeric value at x, real parts
    pub fn evaluate(&self, x: f64) -> DMatrix<f64> {
        DMatrix::from_fn(self.nrows, self.ncols, |i, j| self.data[i][j].approx(x).re)
    }
}

/// increasing k-element subsets of 0..n
pub fn index_subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    (0u64..(1u64 << n))
        .filter(|mask| mask.count_ones() as usize == k)
        .map(|mask| (0..n).filter(|i| mask & (1 << i) != 0).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::algebraic_number::Number;
    use approx::assert_relative_eq;

    fn c(v: i64) -> QuasiPoly {
        QuasiPoly::constant(Number::from_integer(v))
    }

    #[test]
    fn test_constant_determinant() {
        let m = QuasiMatrix::from_rows(vec![
            vec![c(2), c(0), c(1)],
            vec![c(1), c(3), c(2)],
            vec![c(1), c(1), c(2)],
        ]);
        assert_eq!(m.determinant(), c(6));
        let numeric = m.evaluate(0.0).determinant();
        assert_relative_eq!(numeric, 6.0, epsilon = 1e-12);
        let (det, cof) = m.determinant_with_last_row_cofactors();
        assert_eq!(det, c(6));
        assert_eq!(cof[0], m.cofactor(2, 0));
        assert_eq!(cof[2], m.cofactor(2, 2));
    }

    #[test]
    fn test_rank() {
        let m = QuasiMatrix::from_rows(vec![
            vec![c(1), c(2), c(3)],
            vec![c(2), c(4), c(6)],
            vec![c(1), c(0), c(1)],
        ]);
        assert_eq!(m.rank(), 2);
        assert_eq!(m.submatrix(&[0, 2], &[1, 2]).determinant(), c(2));
        let ones = QuasiMatrix::from_rows(vec![vec![c(1); 3]; 3]);
        assert_eq!(ones.rank(), 1);
        assert_eq!(QuasiMatrix::zeros(2, 2).rank(), 0);
        assert_eq!(index_subsets(4, 2).len(), 6);
        assert_eq!(index_subsets(3, 0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_wronskian_of_exponentials() {
        let e1 = QuasiPoly::exponential(Number::one());
        let e2 = QuasiPoly::exponential(Number::from_integer(-1));
        let m = QuasiMatrix::from_rows(vec![vec![e1.clone(), e2.clone()]]);
        let w = QuasiMatrix::from_rows(vec![m.row(0).to_vec(), m.diff().row(0).to_vec()]);
        assert_eq!(w.determinant(), c(-2));
    }

    #[test]
    fn test_trig_wronskian_is_one() {
        let cos = QuasiPoly::cos_term(0, &Number::zero(), &Number::one());
        let sin = QuasiPoly::sin_term(0, &Number::zero(), &Number::one());
        let w = QuasiMatrix::from_rows(vec![vec![cos.clone(), sin.clone()], vec![cos.diff(), sin.diff()]]);
        assert_eq!(w.determinant(), QuasiPoly::one());
        assert_eq!(w.minor(1, 0).determinant(), sin);
    }
}
