use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{matrix::check_indices, Cell, DecisionMatrix, Error};

/// A parameter given either once for everything, once per criterion, or once per matrix cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Param<T> {
    Uniform(T),
    PerCriterion(Vec<T>),
    PerCell(Vec<Vec<T>>),
}

impl<T: Clone> Param<T> {
    /// One value per criterion. `PerCell` is rejected.
    pub fn resolve_criteria(&self, criteria: usize, name: &str) -> Result<Vec<T>, Error> {
        match self {
            Self::Uniform(value) => Ok(vec![value.clone(); criteria]),
            Self::PerCriterion(values) if values.len() == criteria => Ok(values.clone()),
            Self::PerCriterion(values) => Err(Error::invalid(format!(
                "{name} has {} values, expected one per criterion ({criteria})",
                values.len()
            ))),
            Self::PerCell(_) => Err(Error::invalid(format!(
                "{name} cannot be given per cell here"
            ))),
        }
    }

    /// One value per matrix cell, indexed `[alternative][criterion]`.
    pub fn resolve_cells(
        &self,
        alternatives: usize,
        criteria: usize,
        name: &str,
    ) -> Result<Vec<Vec<T>>, Error> {
        match self {
            Self::PerCell(rows) => {
                if rows.len() != alternatives || rows.iter().any(|row| row.len() != criteria) {
                    return Err(Error::invalid(format!(
                        "{name} must be given as a {alternatives}x{criteria} table"
                    )));
                }
                Ok(rows.clone())
            }
            _ => {
                let row = self.resolve_criteria(criteria, name)?;
                Ok(vec![row; alternatives])
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increase,
    Decrease,
    Both,
}

impl Direction {
    /// Signs allowed by this direction, increases first.
    pub fn signs(self) -> &'static [Sign] {
        match self {
            Self::Increase => &[Sign::Increase],
            Self::Decrease => &[Sign::Decrease],
            Self::Both => &[Sign::Increase, Sign::Decrease],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Increase,
    Decrease,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }
}

/// Closed interval `[low, high]` with finite bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Interval {
    low: f64,
    high: f64,
}

impl Interval {
    pub fn new(low: f64, high: f64) -> Result<Self, Error> {
        if !low.is_finite() || !high.is_finite() || (low > high) {
            return Err(Error::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn midpoint(&self) -> f64 {
        self.low + (self.width() / 2.0)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.low..=self.high).contains(&value)
    }
}

/// Which matrix cells a generator modifies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Targets {
    All,
    Criteria(Vec<usize>),
    Alternatives(Vec<usize>),
    Cells(Vec<Cell>),
}

impl Targets {
    /// Row-major list of distinct cells. Fails on out-of-range indices.
    pub fn resolve(&self, matrix: &DecisionMatrix) -> Result<Vec<Cell>, Error> {
        let (alternatives, criteria) = matrix.shape();
        let cells: BTreeSet<Cell> = match self {
            Self::All => all_cells(alternatives, 0..criteria).collect(),
            Self::Criteria(targets) => {
                check_indices(targets, criteria, "criterion")?;
                all_cells(alternatives, targets.iter().copied()).collect()
            }
            Self::Alternatives(targets) => {
                check_indices(targets, alternatives, "alternative")?;
                targets
                    .iter()
                    .flat_map(|&a| (0..criteria).map(move |c| Cell::new(a, c)))
                    .collect()
            }
            Self::Cells(cells) => {
                if let Some(cell) = cells.iter().find(|c| !matrix.contains(**c)) {
                    return Err(Error::invalid(format!(
                        "cell ({}, {}) outside of {alternatives}x{criteria} matrix",
                        cell.alternative, cell.criterion
                    )));
                }
                cells.iter().copied().collect()
            }
        };
        if cells.is_empty() {
            return Err(Error::invalid("no cells targeted"));
        }
        Ok(cells.into_iter().collect())
    }
}

fn all_cells<C>(alternatives: usize, criteria: C) -> impl Iterator<Item = Cell>
where
    C: Iterator<Item = usize> + Clone,
{
    (0..alternatives).flat_map(move |a| criteria.clone().map(move |c| Cell::new(a, c)))
}
