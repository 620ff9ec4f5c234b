use serde::Serialize;

use super::types::YearlySnapshot;

/// Headline figures for a projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub is_plan_failing: bool,
    pub first_shortfall_age: Option<u32>,
    pub retirement_pot: f64,
    pub terminal_pot: f64,
    pub total_contributions: f64,
    pub total_withdrawals: f64,
    pub successful_years: u32,
    pub decumulation_years: u32,
}

pub fn summarize(snapshots: &[YearlySnapshot], retirement_age: u32) -> PlanSummary {
    let first_shortfall_age = snapshots
        .iter()
        .find(|snap| !snap.decumulation_achieved_successfully)
        .map(|snap| snap.age);

    let retirement_pot = snapshots
        .iter()
        .find(|snap| snap.age >= retirement_age)
        .map(|snap| snap.starting_value)
        .or_else(|| snapshots.last().map(|snap| snap.total_ending_value))
        .unwrap_or(0.0);

    let retired = snapshots.iter().filter(|snap| snap.age >= retirement_age);
    let (decumulation_years, successful_years) = retired.fold((0, 0), |(years, ok), snap| {
        (
            years + 1,
            ok + u32::from(snap.decumulation_achieved_successfully),
        )
    });

    PlanSummary {
        is_plan_failing: first_shortfall_age.is_some(),
        first_shortfall_age,
        retirement_pot,
        terminal_pot: snapshots.last().map_or(0.0, |snap| snap.total_ending_value),
        total_contributions: snapshots.iter().map(|snap| snap.money_in().total()).sum(),
        total_withdrawals: snapshots.iter().map(|snap| snap.total_money_out).sum(),
        successful_years,
        decumulation_years,
    }
}
