//! Derives the cake salary from an ingested wage and a live quote.

use crate::error::InvalidComputation;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryComputation {
    /// Salary converted to the base currency.
    pub salary_kzt: f64,
    /// Salary expressed as a count of purchasable cakes.
    pub cake_salary: f64,
    pub computed_at: DateTime<Utc>,
}

/// `salary` is the wage in the reference unit; `kzt_per_unit` is how many
/// base-currency units one reference unit buys; `cake_price_kzt` is the
/// fixed cake price. The cake salary is the wage divided by the cake
/// price re-expressed in the reference unit.
pub fn compute(
    salary: f64,
    kzt_per_unit: f64,
    cake_price_kzt: f64,
) -> Result<SalaryComputation, InvalidComputation> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(InvalidComputation(format!("salary {salary} out of range")));
    }
    if !kzt_per_unit.is_finite() || kzt_per_unit <= 0.0 {
        return Err(InvalidComputation(format!(
            "rate divisor {kzt_per_unit} out of range"
        )));
    }
    if !cake_price_kzt.is_finite() || cake_price_kzt <= 0.0 {
        return Err(InvalidComputation(format!(
            "cake price {cake_price_kzt} out of range"
        )));
    }

    Ok(SalaryComputation {
        salary_kzt: salary * kzt_per_unit,
        cake_salary: salary / (cake_price_kzt / kzt_per_unit),
        computed_at: Utc::now(),
    })
}
