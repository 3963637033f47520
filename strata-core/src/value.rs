//! Cached field values.
//!
//! A field value is either a per-cluster summary (`Scalar`, `Bytes`) or a
//! member-aligned array (`Vector`, `Matrix`) with one row per member
//! observation. Member-aligned values can be concatenated across clusters and
//! sliced by row, which is what the registry's bulk load is built on.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// Row-major matrix of `f32` values, one row per member observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Create a matrix, checking that `data` holds exactly `rows * cols`
    /// values.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, ShapeError> {
        if data.len() != rows * cols {
            return Err(ShapeError::DataLength {
                len: data.len(),
                rows,
                cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from per-member rows of equal width.
    pub fn from_rows(cols: usize, rows: &[&[f32]]) -> Result<Self, ShapeError> {
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(ShapeError::ColumnMismatch {
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// One row as a slice, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.cols;
        Some(&self.data[start..start + self.cols])
    }
}

/// A cached per-cluster attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// One number per cluster (e.g. a quality score).
    Scalar(f64),
    /// One value per member observation.
    Vector(Vec<f32>),
    /// One row of fixed width per member observation.
    Matrix(Matrix),
    /// Opaque blob, not member-aligned.
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Short kind label used in shape diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Vector(_) => "vector",
            FieldValue::Matrix(_) => "matrix",
            FieldValue::Bytes(_) => "bytes",
        }
    }

    /// Number of member rows, or `None` for values that are not
    /// member-aligned.
    pub fn row_count(&self) -> Option<usize> {
        match self {
            FieldValue::Vector(v) => Some(v.len()),
            FieldValue::Matrix(m) => Some(m.rows()),
            FieldValue::Scalar(_) | FieldValue::Bytes(_) => None,
        }
    }

    /// Stack member-aligned values row-wise, in the order given.
    ///
    /// All inputs must be the same variant; matrices must agree on column
    /// count. An empty input concatenates to an empty `Vector`.
    pub fn concat(values: &[FieldValue]) -> Result<FieldValue, ShapeError> {
        let Some(first) = values.first() else {
            return Ok(FieldValue::Vector(Vec::new()));
        };
        match first {
            FieldValue::Vector(_) => {
                let mut out = Vec::new();
                for value in values {
                    match value {
                        FieldValue::Vector(v) => out.extend_from_slice(v),
                        other => {
                            return Err(ShapeError::VariantMismatch {
                                expected: "vector",
                                got: other.kind(),
                            })
                        }
                    }
                }
                Ok(FieldValue::Vector(out))
            }
            FieldValue::Matrix(first_m) => {
                let cols = first_m.cols();
                let mut rows = 0;
                let mut data = Vec::new();
                for value in values {
                    match value {
                        FieldValue::Matrix(m) => {
                            if m.cols() != cols {
                                return Err(ShapeError::ColumnMismatch {
                                    expected: cols,
                                    got: m.cols(),
                                });
                            }
                            rows += m.rows();
                            data.extend_from_slice(m.data());
                        }
                        other => {
                            return Err(ShapeError::VariantMismatch {
                                expected: "matrix",
                                got: other.kind(),
                            })
                        }
                    }
                }
                Ok(FieldValue::Matrix(Matrix { rows, cols, data }))
            }
            other => Err(ShapeError::NotRowAligned { kind: other.kind() }),
        }
    }

    /// Select member rows by position, preserving the order of `indices`.
    pub fn take_rows(&self, indices: &[usize]) -> Result<FieldValue, ShapeError> {
        match self {
            FieldValue::Vector(v) => {
                let mut out = Vec::with_capacity(indices.len());
                for &index in indices {
                    let value = v.get(index).ok_or(ShapeError::RowOutOfBounds {
                        index,
                        rows: v.len(),
                    })?;
                    out.push(*value);
                }
                Ok(FieldValue::Vector(out))
            }
            FieldValue::Matrix(m) => {
                let mut data = Vec::with_capacity(indices.len() * m.cols());
                for &index in indices {
                    let row = m.row(index).ok_or(ShapeError::RowOutOfBounds {
                        index,
                        rows: m.rows(),
                    })?;
                    data.extend_from_slice(row);
                }
                Ok(FieldValue::Matrix(Matrix {
                    rows: indices.len(),
                    cols: m.cols(),
                    data,
                }))
            }
            other => Err(ShapeError::NotRowAligned { kind: other.kind() }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
