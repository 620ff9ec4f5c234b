use super::types::AccountValues;

/// Decides how a year's withdrawal need is split across the three accounts.
///
/// Implementations must keep every draw within `[0, balance]` for its account
/// and must not draw more than `need` in total.
pub trait DrawdownPolicy {
    fn draw(&self, need: f64, balances: AccountValues) -> AccountValues;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TopUpMode {
    /// Only the first account (ISA, GIA, pension) with headroom covers the
    /// shortfall.
    FirstAvailable,
    /// Each account in turn covers what is still missing.
    Cascade,
}

/// ISA first, then GIA, then pension, followed by one top-up pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TaxEfficientDrawdown {
    pub isa_share: f64,
    pub gia_share: f64,
    pub top_up: TopUpMode,
}

impl Default for TaxEfficientDrawdown {
    fn default() -> Self {
        Self {
            isa_share: 0.4,
            gia_share: 0.2,
            top_up: TopUpMode::FirstAvailable,
        }
    }
}

impl TaxEfficientDrawdown {
    pub fn cascading() -> Self {
        Self {
            top_up: TopUpMode::Cascade,
            ..Self::default()
        }
    }
}

impl DrawdownPolicy for TaxEfficientDrawdown {
    fn draw(&self, need: f64, balances: AccountValues) -> AccountValues {
        let need = need.max(0.0);
        let isa = balances.isa.min(need * self.isa_share).max(0.0);
        let gia = balances.gia.min(need * self.gia_share).max(0.0);
        let pension = balances.pension.min(need - isa - gia).max(0.0);
        let mut draws = AccountValues { pension, isa, gia };

        let shortfall = need - draws.total();
        if shortfall > 0.0 {
            top_up(self.top_up, shortfall, balances, &mut draws);
        }
        draws
    }
}

fn top_up(mode: TopUpMode, shortfall: f64, balances: AccountValues, draws: &mut AccountValues) {
    let mut remaining = shortfall;
    let pots = [
        (balances.isa, &mut draws.isa),
        (balances.gia, &mut draws.gia),
        (balances.pension, &mut draws.pension),
    ];
    for (balance, drawn) in pots {
        if remaining <= 0.0 {
            break;
        }
        let headroom = balance - *drawn;
        if headroom <= 0.0 {
            continue;
        }
        let extra = headroom.min(remaining);
        *drawn += extra;
        remaining -= extra;
        if mode == TopUpMode::FirstAvailable {
            break;
        }
    }
}

/// Draws from every account in proportion to its balance.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ProRataDrawdown;

impl DrawdownPolicy for ProRataDrawdown {
    fn draw(&self, need: f64, balances: AccountValues) -> AccountValues {
        let available = balances.total();
        if available <= 0.0 || need <= 0.0 {
            return AccountValues::default();
        }
        let take = need.min(available);
        let scale = take / available;
        AccountValues {
            pension: (balances.pension * scale).min(balances.pension),
            isa: (balances.isa * scale).min(balances.isa),
            gia: (balances.gia * scale).min(balances.gia),
        }
    }
}

/// The drawdown policies a request can select by name.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum WithdrawalPolicy {
    #[default]
    TaxEfficient,
    TaxEfficientCascade,
    ProRata,
}

impl DrawdownPolicy for WithdrawalPolicy {
    fn draw(&self, need: f64, balances: AccountValues) -> AccountValues {
        match self {
            WithdrawalPolicy::TaxEfficient => TaxEfficientDrawdown::default().draw(need, balances),
            WithdrawalPolicy::TaxEfficientCascade => {
                TaxEfficientDrawdown::cascading().draw(need, balances)
            }
            WithdrawalPolicy::ProRata => ProRataDrawdown.draw(need, balances),
        }
    }
}
