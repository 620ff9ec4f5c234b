use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(alias = "Conservative")]
    Conservative,
    #[serde(alias = "Balanced")]
    Balanced,
    #[serde(alias = "Moderate")]
    Moderate,
    #[serde(alias = "Adventurous")]
    Adventurous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub current_age: u32,
    pub desired_retirement_age: u32,
    pub total_after_tax_monthly_income: f64,
    pub net_monthly_essential_expenses: f64,
    pub net_monthly_non_essential_expenses: f64,
    pub pension_starting_value: f64,
    pub isa_starting_value: f64,
    pub gia_starting_value: f64,
    pub risk_level: Option<RiskLevel>,
}

impl UserProfile {
    pub fn monthly_surplus(&self) -> f64 {
        self.total_after_tax_monthly_income
            - (self.net_monthly_essential_expenses + self.net_monthly_non_essential_expenses)
    }

    pub fn starting_balances(&self) -> AccountValues {
        AccountValues {
            pension: self.pension_starting_value,
            isa: self.isa_starting_value,
            gia: self.gia_starting_value,
        }
    }
}

/// Fractions of each year's surplus paid into each account.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContributionSplit {
    pub pension: f64,
    pub isa: f64,
    pub gia: f64,
}

impl Default for ContributionSplit {
    fn default() -> Self {
        Self {
            pension: 0.5,
            isa: 0.3,
            gia: 0.2,
        }
    }
}

impl ContributionSplit {
    pub fn total(self) -> f64 {
        self.pension + self.isa + self.gia
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanSettings {
    pub life_expectancy: u32,
    pub inflation_rate: f64,
    pub contribution_split: ContributionSplit,
}

impl PlanSettings {
    pub const DEFAULT_INFLATION_RATE: f64 = 0.02;

    pub fn new(life_expectancy: u32) -> Self {
        Self {
            life_expectancy,
            inflation_rate: Self::DEFAULT_INFLATION_RATE,
            contribution_split: ContributionSplit::default(),
        }
    }
}

/// One value per account. Used for balances, flows and growth alike.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AccountValues {
    pub pension: f64,
    pub isa: f64,
    pub gia: f64,
}

impl AccountValues {
    pub fn total(self) -> f64 {
        self.pension + self.isa + self.gia
    }
}

/// Annual growth rate per account.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AccountRates {
    pub pension: f64,
    pub isa: f64,
    pub gia: f64,
}

/// Rate table behind a projection. `Default` reproduces the dashboard's
/// reference figures.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Assumptions {
    pub accumulation_growth: AccountRates,
    pub decumulation_growth: AccountRates,
    /// Blended rate behind the `general_growth` column before retirement.
    pub accumulation_headline_growth: f64,
    /// Blended rate behind the `general_growth` column from retirement on.
    pub decumulation_headline_growth: f64,
    /// Share of the yearly need that must be withdrawn for a year to count
    /// as successful.
    pub success_tolerance: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            accumulation_growth: AccountRates {
                pension: 0.06,
                isa: 0.05,
                gia: 0.04,
            },
            decumulation_growth: AccountRates {
                pension: 0.04,
                isa: 0.04,
                gia: 0.03,
            },
            accumulation_headline_growth: 0.05,
            decumulation_headline_growth: 0.04,
            success_tolerance: 0.95,
        }
    }
}

/// One row of the projection table. Field names are the wire format the
/// dashboard table and charts read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySnapshot {
    pub age: u32,
    pub starting_value: f64,
    pub pension_starting_value: f64,
    pub isa_starting_value: f64,
    pub gia_starting_value: f64,
    pub total_money_out: f64,
    pub isa_money_out: f64,
    pub pension_money_out: f64,
    pub gia_money_out: f64,
    pub general_growth: f64,
    pub pension_money_in: f64,
    pub isa_contribution: f64,
    pub gia_contribution: f64,
    pub pension_ending_value: f64,
    pub isa_ending_value: f64,
    pub gia_ending_value: f64,
    pub decumulation_achieved_successfully: bool,
    pub total_ending_value: f64,
}

impl YearlySnapshot {
    pub fn starting_values(&self) -> AccountValues {
        AccountValues {
            pension: self.pension_starting_value,
            isa: self.isa_starting_value,
            gia: self.gia_starting_value,
        }
    }

    pub fn ending_values(&self) -> AccountValues {
        AccountValues {
            pension: self.pension_ending_value,
            isa: self.isa_ending_value,
            gia: self.gia_ending_value,
        }
    }

    pub fn money_in(&self) -> AccountValues {
        AccountValues {
            pension: self.pension_money_in,
            isa: self.isa_contribution,
            gia: self.gia_contribution,
        }
    }

    pub fn money_out(&self) -> AccountValues {
        AccountValues {
            pension: self.pension_money_out,
            isa: self.isa_money_out,
            gia: self.gia_money_out,
        }
    }
}
