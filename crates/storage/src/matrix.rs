//! Sparse boolean matrices and vectors.
//!
//! Only the pattern is stored: a cell is either present (true) or absent.
//! Building from a list of cells combines duplicates with logical OR, so
//! repeated entries collapse into one.
//!
//! # Layout
//!
//! `BoolMatrix` is row-major. Each row is a sorted, deduplicated `Vec<u32>`
//! of column indices, which keeps rows appendable (the relations only ever
//! grow) while allowing merge-style intersection between rows.

use rayon::prelude::*;
use rayon::ThreadPool;

use toprank_core::{TopRankError, TopRankResult};

// ============================================================================
// BoolMatrix
// ============================================================================

/// Row-major sparse boolean matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolMatrix {
    ncols: usize,
    rows: Vec<Vec<u32>>,
}

impl BoolMatrix {
    /// Create an empty `nrows × ncols` matrix.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            ncols,
            rows: vec![Vec::new(); nrows],
        }
    }

    /// Build a matrix from `(row, col)` cells, OR-combining duplicates.
    pub fn build<I>(nrows: usize, ncols: usize, cells: I) -> TopRankResult<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut m = Self::new(nrows, ncols);
        for (r, c) in cells {
            m.check_bounds(r, c)?;
            m.rows[r].push(c as u32);
        }
        for row in &mut m.rows {
            row.sort_unstable();
            row.dedup();
        }
        Ok(m)
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of present cells.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Grow the matrix to at least `nrows × ncols`. Never shrinks.
    pub fn grow(&mut self, nrows: usize, ncols: usize) {
        if nrows > self.rows.len() {
            self.rows.resize_with(nrows, Vec::new);
        }
        self.ncols = self.ncols.max(ncols);
    }

    /// Set a cell. Returns `false` if it was already present.
    pub fn insert(&mut self, row: usize, col: usize) -> TopRankResult<bool> {
        self.check_bounds(row, col)?;
        let cells = &mut self.rows[row];
        match cells.binary_search(&(col as u32)) {
            Ok(_) => Ok(false),
            Err(pos) => {
                cells.insert(pos, col as u32);
                Ok(true)
            }
        }
    }

    /// Whether a cell is present. Out-of-range cells are absent.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .map_or(false, |cells| cells.binary_search(&(col as u32)).is_ok())
    }

    /// Sorted column indices present in `row`. Empty when out of range.
    pub fn row(&self, row: usize) -> &[u32] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reduce every row with logical OR into one vector over the columns:
    /// the result holds each column that has at least one present cell.
    pub fn lor_reduce(&self) -> BoolVector {
        let mut indices: Vec<u32> = self.rows.iter().flatten().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        BoolVector {
            size: self.ncols,
            indices,
        }
    }

    fn check_bounds(&self, row: usize, col: usize) -> TopRankResult<()> {
        if row >= self.rows.len() || col >= self.ncols {
            return Err(TopRankError::relation(format!(
                "cell ({}, {}) outside {}x{} matrix",
                row,
                col,
                self.rows.len(),
                self.ncols
            )));
        }
        if col > u32::MAX as usize {
            return Err(TopRankError::relation(format!(
                "column {} exceeds index width",
                col
            )));
        }
        Ok(())
    }
}

/// Product of a selector matrix with `a` under the LAND/LAND semiring.
///
/// `selector` is `n × k` and `a` is `k × m`. Row `j` of the result holds
/// every column `c` such that `a[i][c]` is present for *all* `i` marked in
/// `selector[j]`: each marked row of `a` is combined with logical AND and
/// the marked rows are reduced with logical AND. A selector row with no
/// marks yields an empty result row.
///
/// Rows are evaluated independently on `pool`; the result does not depend
/// on the number of workers.
pub fn mxm_land_land(
    pool: &ThreadPool,
    selector: &BoolMatrix,
    a: &BoolMatrix,
) -> TopRankResult<BoolMatrix> {
    if selector.ncols() != a.nrows() {
        return Err(TopRankError::relation(format!(
            "dimension mismatch: selector has {} columns, operand has {} rows",
            selector.ncols(),
            a.nrows()
        )));
    }

    let rows: Vec<Vec<u32>> = pool.install(|| {
        selector
            .rows
            .par_iter()
            .map(|marks| intersect_rows(a, marks))
            .collect()
    });

    Ok(BoolMatrix {
        ncols: a.ncols(),
        rows,
    })
}

fn intersect_rows(a: &BoolMatrix, marks: &[u32]) -> Vec<u32> {
    let mut marked = marks.iter().map(|&i| a.row(i as usize));
    let first = match marked.next() {
        Some(row) => row.to_vec(),
        None => return Vec::new(),
    };
    marked.fold(first, |acc, row| intersect_sorted(&acc, row))
}

/// Intersection of two sorted, deduplicated index slices.
fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

// ============================================================================
// BoolVector
// ============================================================================

/// Sparse boolean vector: a sorted set of indices below `size`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolVector {
    size: usize,
    indices: Vec<u32>,
}

impl BoolVector {
    /// Build from indices, OR-combining duplicates.
    pub fn build<I>(size: usize, indices: I) -> TopRankResult<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut out = Vec::new();
        for i in indices {
            if i >= size {
                return Err(TopRankError::relation(format!(
                    "index {} outside vector of size {}",
                    i, size
                )));
            }
            out.push(i as u32);
        }
        out.sort_unstable();
        out.dedup();
        Ok(Self { size, indices: out })
    }

    /// Number of present entries.
    pub fn nvals(&self) -> usize {
        self.indices.len()
    }

    /// `self = self OR other`. Both vectors must have the same size.
    pub fn lor_assign(&mut self, other: &BoolVector) -> TopRankResult<()> {
        if self.size != other.size {
            return Err(TopRankError::relation(format!(
                "dimension mismatch: vectors of size {} and {}",
                self.size, other.size
            )));
        }
        let mut merged = Vec::with_capacity(self.indices.len() + other.indices.len());
        let (a, b) = (&self.indices, &other.indices);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        self.indices = merged;
        Ok(())
    }

    /// Iterate present indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }
}
