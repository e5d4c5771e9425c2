//! Cell identities and cache keys

use crate::basis::{Basis, CashflowSource, Context};
use crate::pnl::{AssetLine, PnlLine, PnlSection};
use crate::rollforward::{Balance, Component, Movement};
use crate::series::{CellKey, Month};
use crate::valuation::{Measure, Stream};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy projection cells, evaluated per cashflow source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cashflow {
    PolsIf,
    PolsDth,
    PolsLapse,
    PolsMat,
    Prem,
    DthBen,
    SurrBen,
    MatBen,
    CommInit,
    CommRen,
    ExpsAcq,
    ExpsMaint,
    ExpsClaimDth,
    ExpsClaimSurr,
    ExpsClaimMat,
    RaCf,
    InsComp,
    InvComp,
    /// Insurance component of claims plus service expenses and commission
    InsuranceServiceOutflow,
    /// Outflows paid at the start of a month
    StartOutflow,
    /// Outflows paid at the end of a month
    EndOutflow,
    /// In-force count over the remaining coverage period
    FuturePolicies,
}

impl Cashflow {
    pub const REPORTED: [Cashflow; 21] = [
        Cashflow::PolsIf,
        Cashflow::PolsDth,
        Cashflow::PolsLapse,
        Cashflow::PolsMat,
        Cashflow::Prem,
        Cashflow::DthBen,
        Cashflow::SurrBen,
        Cashflow::MatBen,
        Cashflow::CommInit,
        Cashflow::CommRen,
        Cashflow::ExpsAcq,
        Cashflow::ExpsMaint,
        Cashflow::ExpsClaimDth,
        Cashflow::ExpsClaimSurr,
        Cashflow::ExpsClaimMat,
        Cashflow::RaCf,
        Cashflow::InsComp,
        Cashflow::InvComp,
        Cashflow::InsuranceServiceOutflow,
        Cashflow::StartOutflow,
        Cashflow::EndOutflow,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Cashflow::PolsIf => "POLS_IF",
            Cashflow::PolsDth => "POLS_DTH",
            Cashflow::PolsLapse => "POLS_LAPSE",
            Cashflow::PolsMat => "POLS_MAT",
            Cashflow::Prem => "PREM",
            Cashflow::DthBen => "DTH_BEN",
            Cashflow::SurrBen => "SURR_BEN",
            Cashflow::MatBen => "MAT_BEN",
            Cashflow::CommInit => "COMM_INIT",
            Cashflow::CommRen => "COMM_REN",
            Cashflow::ExpsAcq => "EXPS_ACQ",
            Cashflow::ExpsMaint => "EXPS_MAINT",
            Cashflow::ExpsClaimDth => "EXPS_CLAIM_DTH",
            Cashflow::ExpsClaimSurr => "EXPS_CLAIM_SURR",
            Cashflow::ExpsClaimMat => "EXPS_CLAIM_MAT",
            Cashflow::RaCf => "RA_CF",
            Cashflow::InsComp => "INS_COMP",
            Cashflow::InvComp => "INV_COMP",
            Cashflow::InsuranceServiceOutflow => "INS_SRV_OUT",
            Cashflow::StartOutflow => "OUT_START",
            Cashflow::EndOutflow => "OUT_END",
            Cashflow::FuturePolicies => "FUTURE_POLS",
        }
    }
}

/// Every cell family in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellId {
    Flow(Cashflow),
    PresentValue(Stream),
    Measure(Measure),
    CoverageUnits,
    Balance(Component, Balance),
    Movement(Component, Movement),
    Pnl(PnlLine),
    PnlSection(PnlSection),
    Profit,
    Assets(AssetLine),
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellId::Flow(c) => f.write_str(c.code()),
            CellId::PresentValue(s) => write!(f, "PV_{}", s.code()),
            CellId::Measure(m) => f.write_str(m.code()),
            CellId::CoverageUnits => f.write_str("COV_UNITS"),
            CellId::Balance(c, b) => write!(f, "{}.{}", c.code(), b.code()),
            CellId::Movement(c, m) => write!(f, "{}.{}", c.code(), m.code()),
            CellId::Pnl(line) => write!(f, "PNL.{}", line.code()),
            CellId::PnlSection(s) => write!(f, "PNL.{}", s.code()),
            CellId::Profit => f.write_str("PNL.PROFIT"),
            CellId::Assets(line) => write!(f, "ASSETS.{}", line.code()),
        }
    }
}

/// Cache key: the cell, the time, and whatever context the cell depends on
///
/// Projection cells carry a source only, valuation cells a source and a basis, ledger
/// and P&L cells neither. The context is always part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub cell: CellId,
    pub t: Month,
    pub source: Option<CashflowSource>,
    pub basis: Option<Basis>,
}

impl CellRef {
    pub fn projected(cell: Cashflow, t: Month, source: CashflowSource) -> Self {
        Self { cell: CellId::Flow(cell), t, source: Some(source.normalized()), basis: None }
    }

    pub fn valued(cell: CellId, t: Month, ctx: Context) -> Self {
        Self { cell, t, source: Some(ctx.source.normalized()), basis: Some(ctx.basis) }
    }

    pub fn ledger(cell: CellId, t: Month) -> Self {
        Self { cell, t, source: None, basis: None }
    }
}

impl CellKey for CellRef {
    fn time(&self) -> Month {
        self.t
    }

    fn label(&self) -> String {
        match (self.source, self.basis) {
            (Some(s), Some(b)) => format!("{}[{}@{}]", self.cell, s, b),
            (Some(s), None) => format!("{}[{}]", self.cell, s),
            _ => self.cell.to_string(),
        }
    }
}
