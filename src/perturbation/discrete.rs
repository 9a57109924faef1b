use serde::{Deserialize, Serialize};

use crate::{
    scenario::number, Cell, DecisionMatrix, Error, Modification, Param, Scenario, Targets,
    Variant,
};

/// Cells changed together. `values[i]` lists the replacement values for `cells[i]`; scenario `j`
/// sets every cell to its `j`-th value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscreteChange {
    pub cells: Vec<Cell>,
    pub values: Vec<Vec<f64>>,
}

/// One scenario per targeted cell and listed replacement value.
pub fn discrete_matrix(
    matrix: &DecisionMatrix,
    values: &Param<Vec<f64>>,
    targets: &Targets,
) -> Result<Vec<Scenario>, Error> {
    let (alternatives, criteria) = matrix.shape();
    let values = values.resolve_cells(alternatives, criteria, "discrete values")?;
    let cells = targets.resolve(matrix)?;

    let mut scenarios = Vec::new();
    for cell in cells {
        for &value in &values[cell.alternative][cell.criterion] {
            let variant = Variant::Matrix(matrix.with_value(cell, value)?);
            scenarios.push((
                Modification::CellValues {
                    changes: vec![(cell, value)],
                },
                variant,
            ));
        }
    }
    Ok(number(scenarios))
}

/// Values of a multi-cell change are paired by position rather than crossed, so each change
/// yields as many scenarios as it lists values per cell.
pub fn discrete_paired(
    matrix: &DecisionMatrix,
    changes: &[DiscreteChange],
) -> Result<Vec<Scenario>, Error> {
    for change in changes {
        if change.cells.is_empty() || (change.cells.len() != change.values.len()) {
            return Err(Error::invalid(format!(
                "{} cells with {} value lists",
                change.cells.len(),
                change.values.len()
            )));
        }
        let expected = change.values[0].len();
        if change.values.iter().any(|v| v.len() != expected) {
            return Err(Error::invalid(
                "paired value lists must all have the same length",
            ));
        }
        if let Some(cell) = change.cells.iter().find(|c| !matrix.contains(**c)) {
            return Err(Error::invalid(format!(
                "cell ({}, {}) outside of the matrix",
                cell.alternative, cell.criterion
            )));
        }
    }

    let mut scenarios = Vec::new();
    for change in changes {
        for j in 0..change.values[0].len() {
            let assignment: Vec<(Cell, f64)> = change
                .cells
                .iter()
                .zip(&change.values)
                .map(|(cell, values)| (*cell, values[j]))
                .collect();
            let variant = Variant::Matrix(matrix.with_values(&assignment)?);
            scenarios.push((
                Modification::CellValues {
                    changes: assignment,
                },
                variant,
            ));
        }
    }
    Ok(number(scenarios))
}
