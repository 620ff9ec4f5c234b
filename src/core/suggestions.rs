use serde::{Serialize, Serializer};

use super::types::{PlanSettings, RiskLevel, UserProfile};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionTarget {
    Settings,
    UserDetails,
}

/// A signed adjustment, rendered on the wire as `"+5"` or `"-200"`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Delta(pub f64);

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:+}", self.0))
    }
}

/// Percentage-point shifts in the contribution split.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_contribution_percentage: Option<Delta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isa_allocation_percentage: Option<Delta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserDetailChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_monthly_non_essential_expenses: Option<Delta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_retirement_age: Option<Delta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub details: String,
    pub projected_impact: String,
    pub impact_level: ImpactLevel,
    pub applicable_to: SuggestionTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_changes: Option<SettingsChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_detail_changes: Option<UserDetailChanges>,
}

impl Suggestion {
    fn for_settings(
        id: &str,
        title: &str,
        details: &str,
        projected_impact: &str,
        impact_level: ImpactLevel,
        changes: SettingsChanges,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            details: details.to_string(),
            projected_impact: projected_impact.to_string(),
            impact_level,
            applicable_to: SuggestionTarget::Settings,
            settings_changes: Some(changes),
            user_detail_changes: None,
        }
    }

    fn for_user_details(
        id: &str,
        title: &str,
        details: &str,
        projected_impact: &str,
        impact_level: ImpactLevel,
        changes: UserDetailChanges,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            details: details.to_string(),
            projected_impact: projected_impact.to_string(),
            impact_level,
            applicable_to: SuggestionTarget::UserDetails,
            settings_changes: None,
            user_detail_changes: Some(changes),
        }
    }
}

/// Suggestions offered for a plan, depending on whether it runs short.
pub fn suggestions_for(is_plan_failing: bool) -> Vec<Suggestion> {
    if is_plan_failing {
        vec![
            Suggestion::for_settings(
                "1",
                "Increase Pension Contributions",
                "Increasing your monthly pension contributions by 5% could significantly improve your retirement outlook.",
                "+£150,000 at retirement",
                ImpactLevel::High,
                SettingsChanges {
                    pension_contribution_percentage: Some(Delta(5.0)),
                    ..SettingsChanges::default()
                },
            ),
            Suggestion::for_user_details(
                "2",
                "Reduce Monthly Expenses",
                "Reducing your non-essential monthly expenses by £200 would allow you to save more towards retirement.",
                "+£100,000 over lifetime",
                ImpactLevel::Medium,
                UserDetailChanges {
                    net_monthly_non_essential_expenses: Some(Delta(-200.0)),
                    ..UserDetailChanges::default()
                },
            ),
            Suggestion::for_user_details(
                "3",
                "Delay Retirement by 2 Years",
                "Delaying your retirement by 2 years would give your investments more time to grow and reduce the withdrawal period.",
                "+£80,000 over lifetime",
                ImpactLevel::High,
                UserDetailChanges {
                    desired_retirement_age: Some(Delta(2.0)),
                    ..UserDetailChanges::default()
                },
            ),
        ]
    } else {
        vec![
            Suggestion::for_settings(
                "1",
                "Optimize ISA Allocation",
                "Increasing your ISA allocation would provide more tax-free growth and withdrawals in retirement.",
                "+£20,000 in tax savings",
                ImpactLevel::Medium,
                SettingsChanges {
                    isa_allocation_percentage: Some(Delta(5.0)),
                    ..SettingsChanges::default()
                },
            ),
            Suggestion::for_user_details(
                "2",
                "Adjust Risk Profile",
                "Your current risk profile is conservative. Considering your age, a slightly more aggressive approach could yield better returns.",
                "+£40,000 over lifetime",
                ImpactLevel::Medium,
                UserDetailChanges {
                    risk_level: Some(RiskLevel::Moderate),
                    ..UserDetailChanges::default()
                },
            ),
        ]
    }
}

pub fn find_suggestion(is_plan_failing: bool, id: &str) -> Option<Suggestion> {
    suggestions_for(is_plan_failing)
        .into_iter()
        .find(|suggestion| suggestion.id == id)
}

/// Applies a suggestion's changes in place. The result is not validated;
/// callers check the adjusted plan before projecting it.
pub fn apply_suggestion(
    suggestion: &Suggestion,
    profile: &mut UserProfile,
    settings: &mut PlanSettings,
) {
    if let Some(changes) = &suggestion.settings_changes {
        let split = &mut settings.contribution_split;
        // GIA funds any shift towards pension or ISA.
        if let Some(Delta(points)) = changes.pension_contribution_percentage {
            let shift = (points / 100.0).clamp(-split.pension.max(0.0), split.gia.max(0.0));
            split.pension += shift;
            split.gia -= shift;
        }
        if let Some(Delta(points)) = changes.isa_allocation_percentage {
            let shift = (points / 100.0).clamp(-split.isa.max(0.0), split.gia.max(0.0));
            split.isa += shift;
            split.gia -= shift;
        }
    }

    if let Some(changes) = &suggestion.user_detail_changes {
        if let Some(Delta(amount)) = changes.net_monthly_non_essential_expenses {
            profile.net_monthly_non_essential_expenses =
                (profile.net_monthly_non_essential_expenses + amount).max(0.0);
        }
        if let Some(Delta(years)) = changes.desired_retirement_age {
            let shifted = i64::from(profile.desired_retirement_age) + years.round() as i64;
            profile.desired_retirement_age = shifted.clamp(0, i64::from(u32::MAX)) as u32;
        }
        if let Some(level) = changes.risk_level {
            profile.risk_level = Some(level);
        }
    }
}
