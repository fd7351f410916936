use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::*;
use crate::valuation::{compute_intrinsic_pe, ParameterKind, ValuationParameters};
use crate::ValuationResult;

const MAX_CELLS: usize = 10_000;

/// One swept parameter: min to max inclusive in `step` increments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepVariable {
    pub parameter: ParameterKind,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Input for a 2-way intrinsic P/E sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// Values for every parameter not being swept
    #[serde(default)]
    pub base: ValuationParameters,
    pub row: SweepVariable,
    pub column: SweepVariable,
}

/// Output of the sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub row_parameter: ParameterKind,
    pub column_parameter: ParameterKind,
    pub row_values: Vec<Decimal>,
    pub column_values: Vec<Decimal>,
    /// matrix[i][j] = intrinsic P/E at row_values[i], column_values[j];
    /// `None` where the model is undefined
    pub matrix: Vec<Vec<Option<Multiple>>>,
    /// Intrinsic P/E of the unmodified base parameters
    pub base_case_value: Option<Multiple>,
    /// Grid cell nearest the base parameters (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values from min to max with step.
fn generate_sweep_values(var: &SweepVariable) -> ValuationResult<Vec<Decimal>> {
    let field = format!("sweep:{}", var.parameter);
    if var.step <= Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(ValuationError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }
    if var.parameter.is_years() && (var.min.fract() != Decimal::ZERO || var.step.fract() != Decimal::ZERO)
    {
        return Err(ValuationError::InvalidInput {
            field,
            reason: "Year sweeps need whole-number min and step".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        if values.len() > MAX_CELLS {
            return Err(ValuationError::InvalidInput {
                field,
                reason: format!("Sweep produces more than {MAX_CELLS} values"),
            });
        }
        current += var.step;
    }
    // Include max when the step does not land on it (rates only)
    if let Some(&last) = values.last() {
        if last < var.max && !var.parameter.is_years() {
            values.push(var.max);
        }
    }
    Ok(values)
}

/// Evaluate the intrinsic P/E across a two-parameter grid.
pub fn calculate_sensitivity(
    input: &SensitivityInput,
) -> ValuationResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.row.parameter == input.column.parameter {
        return Err(ValuationError::InvalidInput {
            field: "column".into(),
            reason: "Row and column must sweep different parameters".into(),
        });
    }

    let row_values = generate_sweep_values(&input.row)?;
    let column_values = generate_sweep_values(&input.column)?;
    if row_values.len() * column_values.len() > MAX_CELLS {
        return Err(ValuationError::InvalidInput {
            field: "grid".into(),
            reason: format!("Grid exceeds {MAX_CELLS} cells"),
        });
    }

    let mut matrix = Vec::with_capacity(row_values.len());
    for rv in &row_values {
        let mut row = Vec::with_capacity(column_values.len());
        for cv in &column_values {
            let mut params = input.base.clone();
            input.row.parameter.set(&mut params, *rv)?;
            input.column.parameter.set(&mut params, *cv)?;
            match compute_intrinsic_pe(&params) {
                Ok(pe) => row.push(Some(pe)),
                Err(e) => {
                    warnings.push(format!(
                        "Undefined at ({}={rv}, {}={cv}): {e}",
                        input.row.parameter, input.column.parameter
                    ));
                    row.push(None);
                }
            }
        }
        matrix.push(row);
    }

    let base_case_value = compute_intrinsic_pe(&input.base).ok();
    let base_case_position = (
        closest_index(&row_values, input.row.parameter.get(&input.base)),
        closest_index(&column_values, input.column.parameter.get(&input.base)),
    );
    tracing::debug!(
        rows = row_values.len(),
        columns = column_values.len(),
        undefined = warnings.len(),
        "sensitivity grid evaluated"
    );

    let output = SensitivityOutput {
        row_parameter: input.row.parameter,
        column_parameter: input.column.parameter,
        row_values,
        column_values,
        matrix,
        base_case_value,
        base_case_position,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Intrinsic P/E Sensitivity",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}
