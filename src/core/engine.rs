use super::drawdown::{DrawdownPolicy, WithdrawalPolicy};
use super::types::{
    AccountRates, AccountValues, Assumptions, PlanSettings, UserProfile, YearlySnapshot,
};

/// One simulated year before snapshot derivation.
#[derive(Debug, Clone, Copy)]
struct YearFlows {
    starting: AccountValues,
    money_in: AccountValues,
    money_out: AccountValues,
    growth: AccountValues,
    ending: AccountValues,
    general_growth: f64,
    success: bool,
}

/// Projects the plan with the reference rate table and tax-efficient drawdown.
pub fn simulate(profile: &UserProfile, settings: &PlanSettings) -> Vec<YearlySnapshot> {
    simulate_with(
        profile,
        settings,
        &Assumptions::default(),
        &WithdrawalPolicy::default(),
    )
}

/// Projects the plan year by year from `current_age` to `life_expectancy`
/// inclusive.
///
/// Inputs are assumed valid: `current_age < desired_retirement_age <
/// life_expectancy` and non-negative money. Nothing is checked here; a
/// horizon that ends before `current_age` yields an empty projection.
pub fn simulate_with<P: DrawdownPolicy + ?Sized>(
    profile: &UserProfile,
    settings: &PlanSettings,
    assumptions: &Assumptions,
    policy: &P,
) -> Vec<YearlySnapshot> {
    let ages = profile.current_age..=settings.life_expectancy;
    let mut snapshots = Vec::with_capacity(ages.clone().count());
    let mut balances = profile.starting_balances();

    for age in ages {
        let flows = if age < profile.desired_retirement_age {
            accumulation_year(profile, settings, assumptions, balances)
        } else {
            decumulation_year(profile, settings, assumptions, policy, balances)
        };
        balances = flows.ending;
        snapshots.push(snapshot_from_flows(age, flows));
    }

    snapshots
}

fn accumulation_year(
    profile: &UserProfile,
    settings: &PlanSettings,
    assumptions: &Assumptions,
    balances: AccountValues,
) -> YearFlows {
    let general_growth =
        round_currency(assumptions.accumulation_headline_growth * balances.total());

    let yearly_contribution = profile.monthly_surplus() * 12.0;
    let split = settings.contribution_split;
    let money_in = AccountValues {
        pension: round_currency(yearly_contribution * split.pension),
        isa: round_currency(yearly_contribution * split.isa),
        gia: round_currency(yearly_contribution * split.gia),
    };

    // A monthly deficit drains the accounts but never takes them below zero.
    let growth = account_growth(balances, assumptions.accumulation_growth);
    let ending = AccountValues {
        pension: (balances.pension + money_in.pension + growth.pension).max(0.0),
        isa: (balances.isa + money_in.isa + growth.isa).max(0.0),
        gia: (balances.gia + money_in.gia + growth.gia).max(0.0),
    };

    YearFlows {
        starting: balances,
        money_in,
        money_out: AccountValues::default(),
        growth,
        ending,
        general_growth,
        success: true,
    }
}

fn decumulation_year<P: DrawdownPolicy + ?Sized>(
    profile: &UserProfile,
    settings: &PlanSettings,
    assumptions: &Assumptions,
    policy: &P,
    balances: AccountValues,
) -> YearFlows {
    let need = yearly_withdrawal(profile, settings);
    let money_out = policy.draw(need, balances);
    let growth = account_growth(balances, assumptions.decumulation_growth);
    let ending = AccountValues {
        pension: (balances.pension - money_out.pension + growth.pension).max(0.0),
        isa: (balances.isa - money_out.isa + growth.isa).max(0.0),
        gia: (balances.gia - money_out.gia + growth.gia).max(0.0),
    };

    YearFlows {
        starting: balances,
        money_in: AccountValues::default(),
        money_out,
        growth,
        ending,
        general_growth: round_currency(assumptions.decumulation_headline_growth * ending.total()),
        success: money_out.total() >= assumptions.success_tolerance * need,
    }
}

/// Essential spending for one retired year, uplifted once by inflation.
pub fn yearly_withdrawal(profile: &UserProfile, settings: &PlanSettings) -> f64 {
    profile.net_monthly_essential_expenses * 12.0 * (1.0 + settings.inflation_rate)
}

fn account_growth(balances: AccountValues, rates: AccountRates) -> AccountValues {
    AccountValues {
        pension: round_currency(balances.pension * rates.pension),
        isa: round_currency(balances.isa * rates.isa),
        gia: round_currency(balances.gia * rates.gia),
    }
}

fn snapshot_from_flows(age: u32, flows: YearFlows) -> YearlySnapshot {
    let starting = flows.starting;
    YearlySnapshot {
        age,
        starting_value: starting.total(),
        pension_starting_value: starting.pension,
        isa_starting_value: starting.isa,
        gia_starting_value: starting.gia,
        total_money_out: flows.money_out.total(),
        isa_money_out: flows.money_out.isa,
        pension_money_out: flows.money_out.pension,
        gia_money_out: flows.money_out.gia,
        general_growth: flows.general_growth,
        pension_money_in: flows.money_in.pension,
        isa_contribution: flows.money_in.isa,
        gia_contribution: flows.money_in.gia,
        pension_ending_value: flows.ending.pension,
        isa_ending_value: flows.ending.isa,
        gia_ending_value: flows.ending.gia,
        decumulation_achieved_successfully: flows.success,
        total_ending_value: flows.ending.total(),
    }
}

/// Rounds half up to a whole currency unit.
pub(crate) fn round_currency(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::drawdown::{ProRataDrawdown, TaxEfficientDrawdown};
    use crate::core::types::ContributionSplit;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn zero_profile(current_age: u32, desired_retirement_age: u32) -> UserProfile {
        UserProfile {
            current_age,
            desired_retirement_age,
            total_after_tax_monthly_income: 0.0,
            net_monthly_essential_expenses: 0.0,
            net_monthly_non_essential_expenses: 0.0,
            pension_starting_value: 0.0,
            isa_starting_value: 0.0,
            gia_starting_value: 0.0,
            risk_level: None,
        }
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            current_age: 35,
            desired_retirement_age: 60,
            total_after_tax_monthly_income: 5_000.0,
            net_monthly_essential_expenses: 2_000.0,
            net_monthly_non_essential_expenses: 1_000.0,
            pension_starting_value: 50_000.0,
            isa_starting_value: 20_000.0,
            gia_starting_value: 10_000.0,
            risk_level: None,
        }
    }

    fn assert_continuity(snapshots: &[YearlySnapshot]) {
        for pair in snapshots.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_approx(next.pension_starting_value, prev.pension_ending_value);
            assert_approx(next.isa_starting_value, prev.isa_ending_value);
            assert_approx(next.gia_starting_value, prev.gia_ending_value);
        }
    }

    #[test]
    fn zero_plan_stays_at_zero_and_succeeds() {
        let profile = zero_profile(25, 65);
        let settings = PlanSettings::new(66);
        let snapshots = simulate(&profile, &settings);

        assert_eq!(snapshots.len(), 42);
        for snap in &snapshots {
            assert_approx(snap.money_in().total(), 0.0);
            assert_approx(snap.general_growth, 0.0);
            assert_approx(snap.total_ending_value, 0.0);
            assert_approx(snap.total_money_out, 0.0);
            assert!(snap.decumulation_achieved_successfully);
        }
        assert_eq!(snapshots.last().map(|s| s.age), Some(66));
    }

    #[test]
    fn one_accumulation_year_then_one_decumulation_year() {
        let mut profile = sample_profile();
        profile.current_age = 64;
        profile.desired_retirement_age = 65;
        let snapshots = simulate(&profile, &PlanSettings::new(65));

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].age, 64);
        assert_eq!(snapshots[1].age, 65);
        assert!(snapshots[0].pension_money_in > 0.0);
        assert_approx(snapshots[0].total_money_out, 0.0);
        assert_approx(snapshots[1].pension_money_in, 0.0);
        assert!(snapshots[1].total_money_out > 0.0);
    }

    #[test]
    fn first_year_contribution_split() {
        let profile = sample_profile();
        let snapshots = simulate(&profile, &PlanSettings::new(95));
        let first = &snapshots[0];

        assert_approx(first.pension_money_in, 12_000.0);
        assert_approx(first.isa_contribution, 7_200.0);
        assert_approx(first.gia_contribution, 4_800.0);
    }

    #[test]
    fn first_year_growth_and_balances_match_reference_figures() {
        let profile = sample_profile();
        let snapshots = simulate(&profile, &PlanSettings::new(95));
        let first = &snapshots[0];

        // 5% of 80k before contributions.
        assert_approx(first.general_growth, 4_000.0);
        assert_approx(first.pension_ending_value, 50_000.0 + 12_000.0 + 3_000.0);
        assert_approx(first.isa_ending_value, 20_000.0 + 7_200.0 + 1_000.0);
        assert_approx(first.gia_ending_value, 10_000.0 + 4_800.0 + 400.0);
        assert_approx(first.pension_starting_value, 50_000.0);
        assert_approx(first.isa_starting_value, 20_000.0);
        assert_approx(first.gia_starting_value, 10_000.0);
        assert_approx(first.starting_value, 80_000.0);
        assert_approx(first.total_ending_value, 65_000.0 + 28_200.0 + 15_200.0);
    }

    #[test]
    fn zero_essential_spending_never_withdraws() {
        let mut profile = zero_profile(60, 62);
        profile.net_monthly_non_essential_expenses = 0.0;
        let snapshots = simulate(&profile, &PlanSettings::new(90));

        for snap in snapshots.iter().filter(|s| s.age >= 62) {
            assert_approx(snap.total_money_out, 0.0);
            assert!(snap.decumulation_achieved_successfully);
        }
    }

    #[test]
    fn first_retired_year_draws_inflated_essentials() {
        let mut profile = zero_profile(60, 61);
        profile.total_after_tax_monthly_income = 1_000.0;
        profile.net_monthly_essential_expenses = 1_000.0;
        profile.pension_starting_value = 100_000.0;
        profile.isa_starting_value = 100_000.0;
        profile.gia_starting_value = 100_000.0;
        let snapshots = simulate(&profile, &PlanSettings::new(61));
        let retired = &snapshots[1];

        let need = 12_000.0 * 1.02;
        assert_approx(retired.total_money_out, need);
        assert_approx(retired.isa_money_out, need * 0.4);
        assert_approx(retired.gia_money_out, need * 0.2);
        assert_approx(retired.pension_money_out, need * 0.4);
        assert!(retired.decumulation_achieved_successfully);
    }

    #[test]
    fn decumulation_applies_post_retirement_rates() {
        let mut profile = zero_profile(59, 60);
        profile.total_after_tax_monthly_income = 1_000.0;
        profile.net_monthly_essential_expenses = 1_000.0;
        profile.pension_starting_value = 100_000.0;
        profile.isa_starting_value = 50_000.0;
        profile.gia_starting_value = 20_000.0;
        let snapshots = simulate(&profile, &PlanSettings::new(60));
        let before = &snapshots[0];
        let retired = &snapshots[1];

        let growth_pension = round_currency(before.pension_ending_value * 0.04);
        let growth_isa = round_currency(before.isa_ending_value * 0.04);
        let growth_gia = round_currency(before.gia_ending_value * 0.03);
        assert_approx(
            retired.pension_ending_value,
            before.pension_ending_value - retired.pension_money_out + growth_pension,
        );
        assert_approx(
            retired.isa_ending_value,
            before.isa_ending_value - retired.isa_money_out + growth_isa,
        );
        assert_approx(
            retired.gia_ending_value,
            before.gia_ending_value - retired.gia_money_out + growth_gia,
        );
        assert_approx(
            retired.general_growth,
            round_currency(retired.total_ending_value * 0.04),
        );
    }

    #[test]
    fn depleted_accounts_fail_and_floor_at_zero() {
        let mut profile = zero_profile(70, 71);
        profile.total_after_tax_monthly_income = 2_000.0;
        profile.net_monthly_essential_expenses = 2_000.0;
        profile.isa_starting_value = 5_000.0;
        let snapshots = simulate(&profile, &PlanSettings::new(75));

        let last = snapshots.last().expect("projection is not empty");
        assert!(!last.decumulation_achieved_successfully);
        assert_approx(last.total_ending_value, 0.0);
        assert!(snapshots.iter().any(|s| !s.decumulation_achieved_successfully));
    }

    #[test]
    fn shortfall_within_tolerance_still_counts_as_success() {
        let mut profile = zero_profile(70, 71);
        profile.total_after_tax_monthly_income = 1_000.0;
        profile.net_monthly_essential_expenses = 1_000.0;
        let need = 12_000.0 * 1.02;
        profile.isa_starting_value = need * 0.96;
        let mut assumptions = Assumptions::default();
        assumptions.accumulation_growth = AccountRates {
            pension: 0.0,
            isa: 0.0,
            gia: 0.0,
        };
        let snapshots = simulate_with(
            &profile,
            &PlanSettings::new(71),
            &assumptions,
            &WithdrawalPolicy::TaxEfficient,
        );

        let retired = &snapshots[1];
        assert_approx(retired.total_money_out, need * 0.96);
        assert!(retired.decumulation_achieved_successfully);
    }

    #[test]
    fn custom_assumptions_change_growth() {
        let profile = sample_profile();
        let mut assumptions = Assumptions::default();
        assumptions.accumulation_growth.pension = 0.0;
        let snapshots = simulate_with(
            &profile,
            &PlanSettings::new(70),
            &assumptions,
            &TaxEfficientDrawdown::default(),
        );
        assert_approx(snapshots[0].pension_ending_value, 62_000.0);
    }

    #[test]
    fn custom_split_routes_everything_to_isa() {
        let profile = sample_profile();
        let mut settings = PlanSettings::new(70);
        settings.contribution_split = ContributionSplit {
            pension: 0.0,
            isa: 1.0,
            gia: 0.0,
        };
        let snapshots = simulate(&profile, &settings);
        assert_approx(snapshots[0].isa_contribution, 24_000.0);
        assert_approx(snapshots[0].pension_money_in, 0.0);
    }

    #[test]
    fn income_deficit_drains_accounts_without_going_negative() {
        let mut profile = zero_profile(60, 62);
        profile.net_monthly_essential_expenses = 1_000.0;
        profile.isa_starting_value = 10_000.0;
        let snapshots = simulate(&profile, &PlanSettings::new(63));

        assert_eq!(snapshots.len(), 4);
        for snap in &snapshots {
            assert!(snap.pension_ending_value >= 0.0);
            assert!(snap.isa_ending_value >= 0.0);
            assert!(snap.gia_ending_value >= 0.0);
            assert!(snap.pension_starting_value >= 0.0);
            assert!(snap.isa_starting_value >= 0.0);
            assert!(snap.gia_starting_value >= 0.0);
        }
        assert!(snapshots[0].money_in().total() < 0.0);
        assert_approx(snapshots[0].isa_starting_value, 10_000.0);
        assert_approx(snapshots[1].isa_starting_value, snapshots[0].isa_ending_value);
        assert_approx(snapshots[2].isa_money_out, snapshots[1].isa_ending_value);
        assert!(!snapshots[2].decumulation_achieved_successfully);
        assert_continuity(&snapshots);
    }

    #[test]
    fn policy_can_be_passed_as_trait_object() {
        let profile = sample_profile();
        let policy: &dyn DrawdownPolicy = &ProRataDrawdown;
        let settings = PlanSettings::new(90);
        let snapshots = simulate_with(&profile, &settings, &Assumptions::default(), policy);
        assert_eq!(snapshots.len(), 56);
        assert_continuity(&snapshots);
    }

    #[test]
    fn horizon_before_current_age_is_empty() {
        let profile = zero_profile(50, 60);
        assert!(simulate(&profile, &PlanSettings::new(40)).is_empty());
    }

    #[test]
    fn round_currency_rounds_half_up() {
        assert_approx(round_currency(2.5), 3.0);
        assert_approx(round_currency(2.4), 2.0);
        assert_approx(round_currency(-2.5), -2.0);
        assert_approx(round_currency(-2.6), -3.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_projection_shape_and_invariants(
            current_age in 18u32..70,
            work_years in 1u32..30,
            retired_years in 1u32..40,
            income in 0u32..12_000,
            essential in 0u32..6_000,
            non_essential_pct in 0u32..101,
            pension in 0u32..800_000,
            isa in 0u32..400_000,
            gia in 0u32..300_000,
            inflation_bp in 0u32..800,
            policy_idx in 0usize..3
        ) {
            let income = income as f64;
            let essential = essential as f64;
            let non_essential = (income - essential).max(0.0) * non_essential_pct as f64 / 100.0;
            let profile = UserProfile {
                current_age,
                desired_retirement_age: current_age + work_years,
                total_after_tax_monthly_income: income,
                net_monthly_essential_expenses: essential,
                net_monthly_non_essential_expenses: non_essential,
                pension_starting_value: pension as f64,
                isa_starting_value: isa as f64,
                gia_starting_value: gia as f64,
                risk_level: None,
            };
            let mut settings = PlanSettings::new(profile.desired_retirement_age + retired_years);
            settings.inflation_rate = inflation_bp as f64 / 10_000.0;
            let policy = [
                WithdrawalPolicy::TaxEfficient,
                WithdrawalPolicy::TaxEfficientCascade,
                WithdrawalPolicy::ProRata,
            ][policy_idx];
            let assumptions = Assumptions::default();

            let snapshots = simulate_with(&profile, &settings, &assumptions, &policy);
            let need = yearly_withdrawal(&profile, &settings);

            prop_assert_eq!(
                snapshots.len(),
                (settings.life_expectancy - profile.current_age + 1) as usize
            );
            for (i, snap) in snapshots.iter().enumerate() {
                prop_assert_eq!(snap.age, profile.current_age + i as u32);
                prop_assert!(snap.pension_ending_value >= 0.0);
                prop_assert!(snap.isa_ending_value >= 0.0);
                prop_assert!(snap.gia_ending_value >= 0.0);
                if snap.age < profile.desired_retirement_age {
                    prop_assert!(snap.decumulation_achieved_successfully);
                    prop_assert!(snap.total_money_out == 0.0);
                } else {
                    let drawn = snap.pension_money_out + snap.isa_money_out + snap.gia_money_out;
                    prop_assert_eq!(
                        snap.decumulation_achieved_successfully,
                        drawn >= assumptions.success_tolerance * need
                    );
                }
            }
            for pair in snapshots.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                prop_assert!((next.pension_starting_value - prev.pension_ending_value).abs() <= EPS);
                prop_assert!((next.isa_starting_value - prev.isa_ending_value).abs() <= EPS);
                prop_assert!((next.gia_starting_value - prev.gia_ending_value).abs() <= EPS);
            }
        }
    }
}
