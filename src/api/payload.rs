use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    Assumptions, ContributionSplit, PlanSettings, PlanSummary, RiskLevel, UserProfile,
    WithdrawalPolicy, YearlySnapshot, simulate_with, summarize,
};

const DEFAULT_CURRENT_AGE: u32 = 30;
const DEFAULT_RETIREMENT_AGE: u32 = 65;
const DEFAULT_LIFE_EXPECTANCY: u32 = 95;
const DEFAULT_PENSION_START: f64 = 50_000.0;
const DEFAULT_ISA_START: f64 = 20_000.0;
const DEFAULT_GIA_START: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("desired_retirement_age ({retirement_age}) must be greater than age ({current_age})")]
    RetirementNotAfterCurrentAge {
        current_age: u32,
        retirement_age: u32,
    },
    #[error(
        "life_expectancy ({life_expectancy}) must be greater than desired_retirement_age ({retirement_age})"
    )]
    LifeExpectancyNotAfterRetirement {
        retirement_age: u32,
        life_expectancy: u32,
    },
    #[error("{field} must be a finite amount >= 0")]
    InvalidAmount { field: &'static str },
    #[error("inflation_percentage must be a fraction between -1 and 1, got {0}")]
    InvalidInflation(f64),
    #[error("contribution percentages must be >= 0")]
    NegativeContributionShare,
    #[error("contribution percentages must add up to 100, got {0}")]
    ContributionSplitTotal(f64),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiWithdrawalPolicy {
    #[serde(alias = "taxEfficient", alias = "tax_efficient")]
    TaxEfficient,
    #[serde(alias = "taxEfficientCascade", alias = "tax_efficient_cascade")]
    TaxEfficientCascade,
    #[serde(alias = "proRata", alias = "pro_rata")]
    ProRata,
}

impl From<ApiWithdrawalPolicy> for WithdrawalPolicy {
    fn from(value: ApiWithdrawalPolicy) -> Self {
        match value {
            ApiWithdrawalPolicy::TaxEfficient => WithdrawalPolicy::TaxEfficient,
            ApiWithdrawalPolicy::TaxEfficientCascade => WithdrawalPolicy::TaxEfficientCascade,
            ApiWithdrawalPolicy::ProRata => WithdrawalPolicy::ProRata,
        }
    }
}

impl From<WithdrawalPolicy> for ApiWithdrawalPolicy {
    fn from(value: WithdrawalPolicy) -> Self {
        match value {
            WithdrawalPolicy::TaxEfficient => ApiWithdrawalPolicy::TaxEfficient,
            WithdrawalPolicy::TaxEfficientCascade => ApiWithdrawalPolicy::TaxEfficientCascade,
            WithdrawalPolicy::ProRata => ApiWithdrawalPolicy::ProRata,
        }
    }
}

/// The dashboard's `userDetails` object. Missing keys fall back to the
/// dashboard defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UserDetailsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_retirement_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_after_tax_monthly_income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_monthly_essential_expenses: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_monthly_non_essential_expenses: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_starting_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isa_starting_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gia_starting_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl From<&UserProfile> for UserDetailsPayload {
    fn from(profile: &UserProfile) -> Self {
        Self {
            age: Some(profile.current_age),
            desired_retirement_age: Some(profile.desired_retirement_age),
            total_after_tax_monthly_income: Some(profile.total_after_tax_monthly_income),
            net_monthly_essential_expenses: Some(profile.net_monthly_essential_expenses),
            net_monthly_non_essential_expenses: Some(profile.net_monthly_non_essential_expenses),
            pension_starting_value: Some(profile.pension_starting_value),
            isa_starting_value: Some(profile.isa_starting_value),
            gia_starting_value: Some(profile.gia_starting_value),
            risk_level: profile.risk_level,
        }
    }
}

/// The dashboard's `settings` object. `inflation_percentage` is a fraction
/// (0.02 is 2%); the contribution keys are percentages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_expectancy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_contribution_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isa_allocation_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gia_allocation_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawal_policy: Option<ApiWithdrawalPolicy>,
}

impl SettingsPayload {
    pub fn from_plan(settings: &PlanSettings, policy: WithdrawalPolicy) -> Self {
        let split = settings.contribution_split;
        Self {
            life_expectancy: Some(settings.life_expectancy),
            inflation_percentage: Some(settings.inflation_rate),
            pension_contribution_percentage: Some(split.pension * 100.0),
            isa_allocation_percentage: Some(split.isa * 100.0),
            gia_allocation_percentage: Some(split.gia * 100.0),
            withdrawal_policy: Some(policy.into()),
        }
    }
}

/// Projection data as the dashboard sends it back: either the bare rows or
/// the `{ "data": [...] }` envelope the projection endpoint returns.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CashFlowData {
    Envelope { data: Vec<YearlySnapshot> },
    Rows(Vec<YearlySnapshot>),
}

impl CashFlowData {
    pub fn rows(&self) -> &[YearlySnapshot] {
        match self {
            CashFlowData::Envelope { data } => data,
            CashFlowData::Rows(rows) => rows,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanPayload {
    pub user_details: Option<UserDetailsPayload>,
    pub settings: Option<SettingsPayload>,
    pub cash_flow_data: Option<CashFlowData>,
    pub is_plan_failing: Option<bool>,
}

/// A validated plan ready to project.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub profile: UserProfile,
    pub settings: PlanSettings,
    pub policy: WithdrawalPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResponse {
    pub data: Vec<YearlySnapshot>,
    pub summary: PlanSummary,
}

impl PlanRequest {
    pub fn project(&self) -> ProjectionResponse {
        let data = simulate_with(
            &self.profile,
            &self.settings,
            &Assumptions::default(),
            &self.policy,
        );
        let summary = summarize(&data, self.profile.desired_retirement_age);
        ProjectionResponse { data, summary }
    }
}

impl PlanPayload {
    pub fn plan_request(&self) -> Result<PlanRequest, ValidationError> {
        plan_request_from_payload(
            self.user_details.clone().unwrap_or_default(),
            self.settings.clone().unwrap_or_default(),
        )
    }
}

pub fn plan_request_from_payload(
    user: UserDetailsPayload,
    settings: SettingsPayload,
) -> Result<PlanRequest, ValidationError> {
    let profile = UserProfile {
        current_age: user.age.unwrap_or(DEFAULT_CURRENT_AGE),
        desired_retirement_age: user
            .desired_retirement_age
            .unwrap_or(DEFAULT_RETIREMENT_AGE),
        total_after_tax_monthly_income: user.total_after_tax_monthly_income.unwrap_or(0.0),
        net_monthly_essential_expenses: user.net_monthly_essential_expenses.unwrap_or(0.0),
        net_monthly_non_essential_expenses: user.net_monthly_non_essential_expenses.unwrap_or(0.0),
        pension_starting_value: user.pension_starting_value.unwrap_or(DEFAULT_PENSION_START),
        isa_starting_value: user.isa_starting_value.unwrap_or(DEFAULT_ISA_START),
        gia_starting_value: user.gia_starting_value.unwrap_or(DEFAULT_GIA_START),
        risk_level: user.risk_level,
    };

    let default_split = ContributionSplit::default();
    let plan_settings = PlanSettings {
        life_expectancy: settings.life_expectancy.unwrap_or(DEFAULT_LIFE_EXPECTANCY),
        inflation_rate: settings
            .inflation_percentage
            .unwrap_or(PlanSettings::DEFAULT_INFLATION_RATE),
        contribution_split: ContributionSplit {
            pension: settings
                .pension_contribution_percentage
                .map_or(default_split.pension, |pct| pct / 100.0),
            isa: settings
                .isa_allocation_percentage
                .map_or(default_split.isa, |pct| pct / 100.0),
            gia: settings
                .gia_allocation_percentage
                .map_or(default_split.gia, |pct| pct / 100.0),
        },
    };

    validate_plan(&profile, &plan_settings)?;

    Ok(PlanRequest {
        profile,
        settings: plan_settings,
        policy: settings
            .withdrawal_policy
            .map(WithdrawalPolicy::from)
            .unwrap_or_default(),
    })
}

/// Checks the preconditions the simulator relies on.
pub fn validate_plan(
    profile: &UserProfile,
    settings: &PlanSettings,
) -> Result<(), ValidationError> {
    if profile.desired_retirement_age <= profile.current_age {
        return Err(ValidationError::RetirementNotAfterCurrentAge {
            current_age: profile.current_age,
            retirement_age: profile.desired_retirement_age,
        });
    }
    if settings.life_expectancy <= profile.desired_retirement_age {
        return Err(ValidationError::LifeExpectancyNotAfterRetirement {
            retirement_age: profile.desired_retirement_age,
            life_expectancy: settings.life_expectancy,
        });
    }
    for (field, amount) in [
        (
            "total_after_tax_monthly_income",
            profile.total_after_tax_monthly_income,
        ),
        (
            "net_monthly_essential_expenses",
            profile.net_monthly_essential_expenses,
        ),
        (
            "net_monthly_non_essential_expenses",
            profile.net_monthly_non_essential_expenses,
        ),
        ("pension_starting_value", profile.pension_starting_value),
        ("isa_starting_value", profile.isa_starting_value),
        ("gia_starting_value", profile.gia_starting_value),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidAmount { field });
        }
    }
    if !settings.inflation_rate.is_finite() || !(-1.0..1.0).contains(&settings.inflation_rate) {
        return Err(ValidationError::InvalidInflation(settings.inflation_rate));
    }

    let split = settings.contribution_split;
    if [split.pension, split.isa, split.gia]
        .iter()
        .any(|share| !share.is_finite() || *share < 0.0)
    {
        return Err(ValidationError::NegativeContributionShare);
    }
    if (split.total() - 1.0).abs() > 1e-6 {
        return Err(ValidationError::ContributionSplitTotal(split.total() * 100.0));
    }
    Ok(())
}
