mod drawdown;
mod engine;
mod suggestions;
mod summary;
mod types;

pub use drawdown::{
    DrawdownPolicy, ProRataDrawdown, TaxEfficientDrawdown, TopUpMode, WithdrawalPolicy,
};
pub use engine::{simulate, simulate_with, yearly_withdrawal};
pub use suggestions::{
    Delta, ImpactLevel, SettingsChanges, Suggestion, SuggestionTarget, UserDetailChanges,
    apply_suggestion, find_suggestion, suggestions_for,
};
pub use summary::{PlanSummary, summarize};
pub use types::{
    AccountRates, AccountValues, Assumptions, ContributionSplit, PlanSettings, RiskLevel,
    UserProfile, YearlySnapshot,
};
