use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CriterionType {
    Benefit,
    Cost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub alternative: usize,
    pub criterion: usize,
}

impl Cell {
    pub fn new(alternative: usize, criterion: usize) -> Self {
        Self {
            alternative,
            criterion,
        }
    }
}

/// Alternatives in rows, criteria in columns. All cells are finite and there is at least one row
/// and one column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecisionMatrix {
    alternatives: usize,
    criteria: usize,
    values: Vec<f64>,
}

impl DecisionMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let alternatives = rows.len();
        let criteria = rows.first().map(|row| row.len()).unwrap_or(0);
        if let Some(index) = rows.iter().position(|row| row.len() != criteria) {
            return Err(Error::invalid(format!(
                "row {index} has {} values, expected {criteria}",
                rows[index].len()
            )));
        }
        Self::from_vec(alternatives, criteria, rows.into_iter().flatten().collect())
    }

    pub fn from_vec(alternatives: usize, criteria: usize, values: Vec<f64>) -> Result<Self, Error> {
        if alternatives == 0 || criteria == 0 {
            return Err(Error::invalid(format!(
                "decision matrix must be at least 1x1, got {alternatives}x{criteria}"
            )));
        }
        if values.len() != alternatives * criteria {
            return Err(Error::invalid(format!(
                "expected {} values for a {alternatives}x{criteria} matrix, got {}",
                alternatives * criteria,
                values.len()
            )));
        }
        let matrix = Self {
            alternatives,
            criteria,
            values,
        };
        matrix.check_finite()?;
        Ok(matrix)
    }

    pub fn alternatives(&self) -> usize {
        self.alternatives
    }

    pub fn criteria(&self) -> usize {
        self.criteria
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.alternatives, self.criteria)
    }

    pub fn get(&self, cell: Cell) -> f64 {
        self.values[self.offset(cell)]
    }

    pub fn row(&self, alternative: usize) -> &[f64] {
        let start = alternative * self.criteria;
        &self.values[start..start + self.criteria]
    }

    pub fn column(&self, criterion: usize) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .skip(criterion)
            .step_by(self.criteria)
            .copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.criteria)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (cell.alternative < self.alternatives) && (cell.criterion < self.criteria)
    }

    /// Copy of this matrix with a single cell replaced.
    pub fn with_value(&self, cell: Cell, value: f64) -> Result<Self, Error> {
        self.with_values(&[(cell, value)])
    }

    /// Copy of this matrix with the given cells replaced. Fails if any new value is not finite.
    pub fn with_values(&self, changes: &[(Cell, f64)]) -> Result<Self, Error> {
        let mut values = self.values.clone();
        for &(cell, value) in changes {
            if !self.contains(cell) {
                return Err(Error::invalid(format!(
                    "cell ({}, {}) outside of {}x{} matrix",
                    cell.alternative, cell.criterion, self.alternatives, self.criteria
                )));
            }
            if !value.is_finite() {
                return Err(Error::NumericInstability(format!(
                    "value {value} at alternative {}, criterion {}",
                    cell.alternative, cell.criterion
                )));
            }
            values[self.offset(cell)] = value;
        }
        Ok(Self {
            alternatives: self.alternatives,
            criteria: self.criteria,
            values,
        })
    }

    pub fn without_alternatives(&self, removed: &[usize]) -> Result<Self, Error> {
        check_indices(removed, self.alternatives, "alternative")?;
        let values: Vec<f64> = self
            .rows()
            .enumerate()
            .filter(|(a, _)| !removed.contains(a))
            .flat_map(|(_, row)| row.iter().copied())
            .collect();
        Self::from_vec(values.len() / self.criteria, self.criteria, values)
            .map_err(|_| Error::invalid("at least one alternative must remain"))
    }

    pub fn without_criteria(&self, removed: &[usize]) -> Result<Self, Error> {
        check_indices(removed, self.criteria, "criterion")?;
        let kept = (0..self.criteria).filter(|c| !removed.contains(c)).count();
        if kept == 0 {
            return Err(Error::invalid("at least one criterion must remain"));
        }
        let values: Vec<f64> = self
            .rows()
            .flat_map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(c, _)| !removed.contains(c))
                    .map(|(_, v)| *v)
            })
            .collect();
        Self::from_vec(self.alternatives, kept, values)
    }

    /// Cells whose values differ from `other`. Both matrices must have the same shape.
    pub fn differing_cells(&self, other: &Self) -> Vec<Cell> {
        debug_assert_eq!(self.shape(), other.shape());
        self.values
            .iter()
            .zip(&other.values)
            .enumerate()
            .filter(|(_, (a, b))| a.to_bits() != b.to_bits())
            .map(|(i, _)| Cell::new(i / self.criteria, i % self.criteria))
            .collect()
    }

    fn offset(&self, cell: Cell) -> usize {
        (cell.alternative * self.criteria) + cell.criterion
    }

    fn check_finite(&self) -> Result<(), Error> {
        match self.values.iter().position(|v| !v.is_finite()) {
            None => Ok(()),
            Some(i) => Err(Error::NumericInstability(format!(
                "value {} at alternative {}, criterion {}",
                self.values[i],
                i / self.criteria,
                i % self.criteria
            ))),
        }
    }
}

pub(crate) fn check_indices(indices: &[usize], len: usize, what: &str) -> Result<(), Error> {
    match indices.iter().find(|&&i| i >= len) {
        None => Ok(()),
        Some(i) => Err(Error::invalid(format!(
            "{what} index {i} out of range 0..{len}"
        ))),
    }
}
