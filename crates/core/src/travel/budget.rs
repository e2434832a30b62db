//! # Budget Estimator
//!
//! Flat per-day cost model: accommodation 100, food 50, local transport 20
//! and attractions 30 per day, plus 50 miscellaneous per trip. The
//! destination is carried through but does not change the figures.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::BudgetError;

pub const DEFAULT_DURATION_DAYS: u64 = 7;

const ACCOMMODATION_PER_DAY: u64 = 100;
const FOOD_PER_DAY: u64 = 50;
const LOCAL_TRANSPORT_PER_DAY: u64 = 20;
const ATTRACTIONS_PER_DAY: u64 = 30;
const MISCELLANEOUS_FLAT: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CostBreakdown {
    pub accommodation: u64,
    pub food: u64,
    pub local_transport: u64,
    pub attractions: u64,
    pub miscellaneous: u64,
}

impl CostBreakdown {
    /// Categories in display order
    pub fn categories(&self) -> [(&'static str, u64); 5] {
        [
            ("accommodation", self.accommodation),
            ("food", self.food),
            ("local_transport", self.local_transport),
            ("attractions", self.attractions),
            ("miscellaneous", self.miscellaneous),
        ]
    }
}

/// One slice of the budget chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetShare {
    pub category: String,
    pub amount: u64,
    /// Percentage of the total, 0-100
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetEstimate {
    pub destination: String,
    pub duration_days: u64,
    pub total_estimated_budget: u64,
    pub cost_breakdown: CostBreakdown,
}

impl BudgetEstimate {
    /// Per-category amounts with their share of the total
    pub fn shares(&self) -> Vec<BudgetShare> {
        let total = self.total_estimated_budget as f64;
        self.cost_breakdown
            .categories()
            .iter()
            .map(|(category, amount)| BudgetShare {
                category: category.to_string(),
                amount: *amount,
                percent: if total > 0.0 {
                    *amount as f64 * 100.0 / total
                } else {
                    0.0
                },
            })
            .collect()
    }
}

fn per_day(rate: u64, duration_days: u64) -> Result<u64, BudgetError> {
    rate.checked_mul(duration_days)
        .ok_or(BudgetError::Overflow { duration_days })
}

/// Estimate the cost of a trip of `duration_days` days
pub fn estimate_trip_budget(
    destination: &str,
    duration_days: u64,
) -> Result<BudgetEstimate, BudgetError> {
    let cost_breakdown = CostBreakdown {
        accommodation: per_day(ACCOMMODATION_PER_DAY, duration_days)?,
        food: per_day(FOOD_PER_DAY, duration_days)?,
        local_transport: per_day(LOCAL_TRANSPORT_PER_DAY, duration_days)?,
        attractions: per_day(ATTRACTIONS_PER_DAY, duration_days)?,
        miscellaneous: MISCELLANEOUS_FLAT,
    };

    let total_estimated_budget = cost_breakdown
        .categories()
        .iter()
        .try_fold(0u64, |acc, (_, amount)| acc.checked_add(*amount))
        .ok_or(BudgetError::Overflow { duration_days })?;

    Ok(BudgetEstimate {
        destination: destination.to_string(),
        duration_days,
        total_estimated_budget,
        cost_breakdown,
    })
}
