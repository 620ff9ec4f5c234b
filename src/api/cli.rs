use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use thiserror::Error;

use super::payload::{PlanRequest, ValidationError, validate_plan};
use super::run_http_server;
use crate::core::{ContributionSplit, PlanSettings, UserProfile, WithdrawalPolicy};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid plan: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to encode projection: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliWithdrawalPolicy {
    TaxEfficient,
    TaxEfficientCascade,
    ProRata,
}

impl From<CliWithdrawalPolicy> for WithdrawalPolicy {
    fn from(value: CliWithdrawalPolicy) -> Self {
        match value {
            CliWithdrawalPolicy::TaxEfficient => WithdrawalPolicy::TaxEfficient,
            CliWithdrawalPolicy::TaxEfficientCascade => WithdrawalPolicy::TaxEfficientCascade,
            CliWithdrawalPolicy::ProRata => WithdrawalPolicy::ProRata,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cashflow-planner",
    about = "Year-by-year retirement cash-flow projections (pension + ISA + GIA)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API used by the planning dashboard
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Print a single projection as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 30)]
    pub current_age: u32,
    #[arg(long, default_value_t = 65)]
    pub retirement_age: u32,
    #[arg(long, default_value_t = 95, help = "Age to project through")]
    pub life_expectancy: u32,
    #[arg(long, default_value_t = 0.0, help = "Monthly income after tax")]
    pub monthly_income: f64,
    #[arg(long, default_value_t = 0.0)]
    pub essential_expenses: f64,
    #[arg(long, default_value_t = 0.0)]
    pub non_essential_expenses: f64,
    #[arg(long, default_value_t = 50_000.0)]
    pub pension_start: f64,
    #[arg(long, default_value_t = 20_000.0)]
    pub isa_start: f64,
    #[arg(long, default_value_t = 10_000.0)]
    pub gia_start: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Inflation uplift on retirement spending in percent"
    )]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "Share of surplus paid into the pension in percent"
    )]
    pub pension_contribution: f64,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Share of surplus paid into the ISA in percent"
    )]
    pub isa_contribution: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Share of surplus paid into the GIA in percent"
    )]
    pub gia_contribution: f64,
    #[arg(long, value_enum, default_value_t = CliWithdrawalPolicy::TaxEfficient)]
    pub withdrawal_policy: CliWithdrawalPolicy,
}

pub fn build_plan(args: &ProjectArgs) -> Result<PlanRequest, ValidationError> {
    let profile = UserProfile {
        current_age: args.current_age,
        desired_retirement_age: args.retirement_age,
        total_after_tax_monthly_income: args.monthly_income,
        net_monthly_essential_expenses: args.essential_expenses,
        net_monthly_non_essential_expenses: args.non_essential_expenses,
        pension_starting_value: args.pension_start,
        isa_starting_value: args.isa_start,
        gia_starting_value: args.gia_start,
        risk_level: None,
    };
    let settings = PlanSettings {
        life_expectancy: args.life_expectancy,
        inflation_rate: args.inflation_rate / 100.0,
        contribution_split: ContributionSplit {
            pension: args.pension_contribution / 100.0,
            isa: args.isa_contribution / 100.0,
            gia: args.gia_contribution / 100.0,
        },
    };
    validate_plan(&profile, &settings)?;
    Ok(PlanRequest {
        profile,
        settings,
        policy: args.withdrawal_policy.into(),
    })
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { port } => run_http_server(port).await?,
        Command::Project(args) => {
            let plan = build_plan(&args)?;
            let projection = plan.project();
            info!(
                "projected {} years, plan failing: {}",
                projection.data.len(),
                projection.summary.is_plan_failing
            );
            println!("{}", serde_json::to_string_pretty(&projection)?);
        }
    }
    Ok(())
}
