//! Roll-forward ledger: opening balance, ordered movements, closing balance
//!
//! Each component has an explicit movement registry built once per model. Closing
//! balances are the opening plus the registry sum, and the reconciliation checks
//! re-derive them independently.

mod acquisition;
mod bel;
mod csm;
mod ledger;
mod loss;
mod ra;
mod reconcile;
mod total;

pub use reconcile::Tolerance;

use crate::basis::{Assumption, ScenarioMatrix};
use serde::{Deserialize, Serialize};

/// Balance sheet items that roll forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    Bel,
    Ra,
    Csm,
    /// Shadow ledger of the loss on onerous groups, outside the total
    LossComponent,
    /// Insurance acquisition cashflows awaiting amortisation
    AcquisitionCashflows,
    /// BEL + RA + CSM, rolled up from their movements
    Total,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Bel,
        Component::Ra,
        Component::Csm,
        Component::LossComponent,
        Component::AcquisitionCashflows,
        Component::Total,
    ];

    /// Components whose movements roll up into the total
    pub const LIABILITY: [Component; 3] = [Component::Bel, Component::Ra, Component::Csm];

    pub fn code(&self) -> &'static str {
        match self {
            Component::Bel => "BEL",
            Component::Ra => "RA",
            Component::Csm => "CSM",
            Component::LossComponent => "LC",
            Component::AcquisitionCashflows => "ACQ",
            Component::Total => "TOTAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Balance {
    Opening,
    Closing,
}

impl Balance {
    pub fn code(&self) -> &'static str {
        match self {
            Balance::Opening => "OPENING",
            Balance::Closing => "CLOSING",
        }
    }
}

/// Named changes between opening and closing balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Movement {
    NewBusiness,
    ExpectedInflow,
    ExpectedInsuranceOutflow,
    ExpectedInvestmentOutflow,
    /// Total-ledger roll-up of expected outflows and investment experience
    ExpectedOutflow,
    /// Interest accretion
    FinanceEffect,
    PremiumExperience,
    InvestmentExperience,
    /// Actual-versus-expected at locked rates
    ExperienceVarianceLocked,
    /// Move from locked to previous rates on the actual projection
    ExperienceVarianceCurrent,
    /// Total-ledger roll-up of both experience variances
    ExperienceVariance,
    DiscountRateChange,
    AssumptionChangeLocked(Assumption),
    AssumptionChangeCurrent(Assumption),
    /// Total-ledger roll-up of both parts of an assumption change
    AssumptionChange(Assumption),
    OnerousTransfer,
    FcfChange,
    AcquisitionCashflow,
    Release,
}

impl Movement {
    pub fn code(&self) -> String {
        let fixed = match self {
            Movement::NewBusiness => "NB",
            Movement::ExpectedInflow => "EXP_INFLOW",
            Movement::ExpectedInsuranceOutflow => "EXP_INS_OUTFLOW",
            Movement::ExpectedInvestmentOutflow => "EXP_INV_OUTFLOW",
            Movement::ExpectedOutflow => "EXP_OUTFLOW",
            Movement::FinanceEffect => "FIN",
            Movement::PremiumExperience => "PREM_EXPERIENCE",
            Movement::InvestmentExperience => "INV_EXPERIENCE",
            Movement::ExperienceVarianceLocked => "XPLR",
            Movement::ExperienceVarianceCurrent => "XPCR",
            Movement::ExperienceVariance => "XP",
            Movement::DiscountRateChange => "DISC",
            Movement::AssumptionChangeLocked(a) => return format!("{}_LR", a.name().to_uppercase()),
            Movement::AssumptionChangeCurrent(a) => return format!("{}_CR", a.name().to_uppercase()),
            Movement::AssumptionChange(a) => return a.name().to_uppercase(),
            Movement::OnerousTransfer => "ONEROUS_TRANSFER",
            Movement::FcfChange => "FCF_CHANGE",
            Movement::AcquisitionCashflow => "ACQ_CF",
            Movement::Release => "RELEASE",
        };
        fixed.to_string()
    }

    /// Movement of the total ledger this movement is reported under
    pub fn rollup(&self) -> Movement {
        match *self {
            Movement::PremiumExperience => Movement::ExpectedInflow,
            Movement::ExpectedInsuranceOutflow
            | Movement::ExpectedInvestmentOutflow
            | Movement::InvestmentExperience => Movement::ExpectedOutflow,
            Movement::ExperienceVarianceLocked | Movement::ExperienceVarianceCurrent => {
                Movement::ExperienceVariance
            }
            Movement::AssumptionChangeLocked(a) | Movement::AssumptionChangeCurrent(a) => {
                Movement::AssumptionChange(a)
            }
            other => other,
        }
    }
}

/// Ordered movement lists per component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRegistry {
    bel: Vec<Movement>,
    ra: Vec<Movement>,
    csm: Vec<Movement>,
    loss: Vec<Movement>,
    acquisition: Vec<Movement>,
    total: Vec<Movement>,
}

impl LedgerRegistry {
    /// Registries for a scenario matrix; assumption changes follow the matrix run order.
    pub fn new(scenarios: &ScenarioMatrix) -> Self {
        let rebased = scenarios.rebased_assumptions();
        let locked = rebased.iter().map(|&a| Movement::AssumptionChangeLocked(a));
        let both = rebased
            .iter()
            .flat_map(|&a| [Movement::AssumptionChangeLocked(a), Movement::AssumptionChangeCurrent(a)]);

        let mut bel = vec![
            Movement::NewBusiness,
            Movement::ExpectedInflow,
            Movement::ExpectedInsuranceOutflow,
            Movement::ExpectedInvestmentOutflow,
            Movement::FinanceEffect,
            Movement::ExperienceVarianceLocked,
            Movement::ExperienceVarianceCurrent,
            Movement::DiscountRateChange,
        ];
        bel.extend(both.clone());

        let mut ra = vec![
            Movement::NewBusiness,
            Movement::FinanceEffect,
            Movement::ExperienceVarianceLocked,
            Movement::ExperienceVarianceCurrent,
            Movement::DiscountRateChange,
        ];
        ra.extend(both);
        ra.push(Movement::Release);

        let mut csm = vec![
            Movement::NewBusiness,
            Movement::FinanceEffect,
            Movement::PremiumExperience,
            Movement::InvestmentExperience,
            Movement::ExperienceVarianceLocked,
        ];
        csm.extend(locked);
        csm.extend([Movement::OnerousTransfer, Movement::Release]);

        let loss = vec![
            Movement::NewBusiness,
            Movement::FinanceEffect,
            Movement::OnerousTransfer,
            Movement::FcfChange,
            Movement::Release,
        ];

        let acquisition = vec![Movement::AcquisitionCashflow, Movement::FinanceEffect, Movement::Release];

        let mut total = Vec::new();
        for movement in bel.iter().chain(&ra).chain(&csm).map(Movement::rollup) {
            if !total.contains(&movement) {
                total.push(movement);
            }
        }
        total.sort();

        Self { bel, ra, csm, loss, acquisition, total }
    }

    pub fn movements(&self, component: Component) -> &[Movement] {
        match component {
            Component::Bel => &self.bel,
            Component::Ra => &self.ra,
            Component::Csm => &self.csm,
            Component::LossComponent => &self.loss,
            Component::AcquisitionCashflows => &self.acquisition,
            Component::Total => &self.total,
        }
    }

    /// Movements listed before `movement` in a component's registry
    pub fn preceding(&self, component: Component, movement: Movement) -> &[Movement] {
        let list = self.movements(component);
        let end = list.iter().position(|&m| m == movement).unwrap_or(list.len());
        &list[..end]
    }

    /// Component movements reported under a total-ledger movement
    pub fn rolled_into(&self, total: Movement) -> Vec<(Component, Movement)> {
        Component::LIABILITY
            .into_iter()
            .flat_map(|c| self.movements(c).iter().map(move |&m| (c, m)))
            .filter(|(_, m)| m.rollup() == total)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_follows_matrix() {
        let registry = LedgerRegistry::new(&ScenarioMatrix::sequential());
        let bel = registry.movements(Component::Bel);
        assert_eq!(bel.len(), 8 + 6);
        assert_eq!(bel[8], Movement::AssumptionChangeLocked(Assumption::Mortality));
        assert_eq!(bel[13], Movement::AssumptionChangeCurrent(Assumption::Inflation));

        let unchanged = LedgerRegistry::new(&ScenarioMatrix::unchanged());
        assert_eq!(unchanged.movements(Component::Bel).len(), 8);
        assert!(!unchanged
            .movements(Component::Total)
            .iter()
            .any(|m| matches!(m, Movement::AssumptionChange(_))));
    }

    #[test]
    fn test_total_registry_is_rolled_up() {
        let registry = LedgerRegistry::new(&ScenarioMatrix::sequential());
        let total = registry.movements(Component::Total);
        assert_eq!(total[0], Movement::NewBusiness);
        assert!(total.contains(&Movement::ExpectedOutflow));
        assert!(total.contains(&Movement::AssumptionChange(Assumption::Lapse)));
        assert!(!total.contains(&Movement::PremiumExperience));
        assert!(!total.contains(&Movement::FcfChange));

        let outflow = registry.rolled_into(Movement::ExpectedOutflow);
        assert_eq!(outflow.len(), 3);
        assert!(outflow.contains(&(Component::Csm, Movement::InvestmentExperience)));
    }

    #[test]
    fn test_preceding_movements() {
        let registry = LedgerRegistry::new(&ScenarioMatrix::unchanged());
        assert_eq!(
            registry.preceding(Component::LossComponent, Movement::FcfChange),
            &[Movement::NewBusiness, Movement::FinanceEffect, Movement::OnerousTransfer]
        );
    }

    #[test]
    fn test_movement_codes() {
        assert_eq!(Movement::AssumptionChangeLocked(Assumption::Lapse).code(), "LAPSE_LR");
        assert_eq!(Movement::FinanceEffect.code(), "FIN");
    }
}
