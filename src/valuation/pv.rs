//! Present values of cashflow streams

use crate::basis::{Context, Timing};
use crate::error::Result;
use crate::projection::{Cashflow, CellId, CellRef, Model};
use crate::series::{Eval, Month, Series};
use serde::{Deserialize, Serialize};

/// Discounted cashflow groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stream {
    Premiums,
    DeathBenefits,
    /// Surrender and maturity benefits
    OtherBenefits,
    Commissions,
    /// Maintenance and claim expenses
    Expenses,
    Acquisition,
    RiskAdjustment,
}

impl Stream {
    pub const ALL: [Stream; 7] = [
        Stream::Premiums,
        Stream::DeathBenefits,
        Stream::OtherBenefits,
        Stream::Commissions,
        Stream::Expenses,
        Stream::Acquisition,
        Stream::RiskAdjustment,
    ];

    /// Streams that make up the best estimate liability, outflows positive
    pub const FULFILMENT: [Stream; 6] = [
        Stream::Premiums,
        Stream::DeathBenefits,
        Stream::OtherBenefits,
        Stream::Commissions,
        Stream::Expenses,
        Stream::Acquisition,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Stream::Premiums => "PREM",
            Stream::DeathBenefits => "DTH_BEN",
            Stream::OtherBenefits => "OTH_BEN",
            Stream::Commissions => "COMM",
            Stream::Expenses => "EXPS",
            Stream::Acquisition => "ACQ",
            Stream::RiskAdjustment => "RA",
        }
    }

    pub fn is_inflow(&self) -> bool {
        matches!(self, Stream::Premiums)
    }

    /// Projection cells in the stream and where in the month each falls
    pub fn flows(&self) -> &'static [(Cashflow, Timing)] {
        match self {
            Stream::Premiums => &[(Cashflow::Prem, Timing::Start)],
            Stream::DeathBenefits => &[(Cashflow::DthBen, Timing::End)],
            Stream::OtherBenefits => &[(Cashflow::MatBen, Timing::Start), (Cashflow::SurrBen, Timing::End)],
            Stream::Commissions => &[(Cashflow::CommInit, Timing::Start), (Cashflow::CommRen, Timing::Start)],
            Stream::Expenses => &[
                (Cashflow::ExpsMaint, Timing::Start),
                (Cashflow::ExpsClaimMat, Timing::Start),
                (Cashflow::ExpsClaimDth, Timing::End),
                (Cashflow::ExpsClaimSurr, Timing::End),
            ],
            Stream::Acquisition => &[(Cashflow::ExpsAcq, Timing::Start)],
            Stream::RiskAdjustment => &[(Cashflow::RaCf, Timing::End)],
        }
    }
}

impl Model {
    /// Value at time `t - 1` of the stream's cashflows from month `t` onwards.
    ///
    /// Start-of-month flows are undiscounted for their own month, end-of-month flows
    /// and everything later carry one month of discount at `ctx.basis`.
    pub fn present_value(&self, stream: Stream, t: Month, ctx: Context) -> Result<Series> {
        self.cell(CellRef::valued(CellId::PresentValue(stream), t, ctx), || {
            if t == 0 {
                return Ok(Eval::Boundary(self.zeros()));
            }

            let n = self.len();
            let mut start = Vec::new();
            let mut end = Vec::new();
            for &(cf, timing) in stream.flows() {
                let value = self.cashflow(cf, t, ctx.source)?;
                match timing {
                    Timing::Start => start.push(value),
                    Timing::End => end.push(value),
                }
            }
            let later = self.present_value(stream, t + 1, ctx)?;
            let v = 1.0 / (1.0 + self.discount_rate(t, ctx.basis));

            let start = Series::total(n, &start);
            let deferred = Series::total(n, end.iter().chain(std::iter::once(&later)));
            Ok(Eval::Recursive(&start + &deferred.scale(v)))
        })
    }
}
