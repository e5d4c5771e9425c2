//! Profit and loss lines and the supporting asset roll-forward
//!
//! Revenue lines are positive, expense lines negative. Profit is the sum of the
//! revenue, expense and financial sections and is released from the assets, so the
//! asset balance tracks the total liability month by month.

mod assets;
mod lines;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PnlSection {
    Revenue,
    Expense,
    Financial,
}

impl PnlSection {
    pub const ALL: [PnlSection; 3] = [PnlSection::Revenue, PnlSection::Expense, PnlSection::Financial];

    pub fn code(&self) -> &'static str {
        match self {
            PnlSection::Revenue => "REVENUE",
            PnlSection::Expense => "EXPENSE",
            PnlSection::Financial => "FINANCIAL",
        }
    }

    /// Lines making up the section, in reporting order
    pub fn lines(&self) -> &'static [PnlLine] {
        match self {
            PnlSection::Revenue => &[
                PnlLine::CsmRelease,
                PnlLine::LossComponentRelease,
                PnlLine::RaRelease,
                PnlLine::ExpectedInsuranceOutflow,
                PnlLine::AcquisitionRecovery,
            ],
            PnlSection::Expense => &[
                PnlLine::ActualInsuranceOutflow,
                PnlLine::LossEstablishment,
                PnlLine::OnerousFcfChange,
                PnlLine::OnerousExperience,
                PnlLine::LossComponentReversal,
                PnlLine::AcquisitionAmortisation,
            ],
            PnlSection::Financial => &[PnlLine::InvestmentIncome, PnlLine::InsuranceFinanceExpense],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PnlLine {
    CsmRelease,
    /// Expected outflows allocated to the loss component, taken out of revenue
    LossComponentRelease,
    RaRelease,
    ExpectedInsuranceOutflow,
    AcquisitionRecovery,
    ActualInsuranceOutflow,
    /// Loss at recognition and onerous transfers out of the CSM
    LossEstablishment,
    OnerousFcfChange,
    /// Premium, investment and acquisition experience of onerous groups
    OnerousExperience,
    LossComponentReversal,
    AcquisitionAmortisation,
    InvestmentIncome,
    InsuranceFinanceExpense,
}

impl PnlLine {
    pub fn code(&self) -> &'static str {
        match self {
            PnlLine::CsmRelease => "CSM_RELEASE",
            PnlLine::LossComponentRelease => "LC_RELEASE",
            PnlLine::RaRelease => "RA_RELEASE",
            PnlLine::ExpectedInsuranceOutflow => "EXP_INS_OUTFLOW",
            PnlLine::AcquisitionRecovery => "ACQ_RECOVERY",
            PnlLine::ActualInsuranceOutflow => "ACT_INS_OUTFLOW",
            PnlLine::LossEstablishment => "LOSS_ESTABLISHMENT",
            PnlLine::OnerousFcfChange => "ONEROUS_FCF_CHANGE",
            PnlLine::OnerousExperience => "ONEROUS_EXPERIENCE",
            PnlLine::LossComponentReversal => "LC_REVERSAL",
            PnlLine::AcquisitionAmortisation => "ACQ_AMORTISATION",
            PnlLine::InvestmentIncome => "INV_INCOME",
            PnlLine::InsuranceFinanceExpense => "INS_FIN_EXPENSE",
        }
    }

    pub fn section(&self) -> PnlSection {
        PnlSection::ALL
            .into_iter()
            .find(|s| s.lines().contains(self))
            .unwrap_or(PnlSection::Financial)
    }
}

/// Asset roll-forward lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetLine {
    Opening,
    /// Premiums less start-of-month outgo
    Cashflow,
    InvestmentIncome,
    /// End-of-month claims, negative
    Benefits,
    /// Profit paid away, negative for a profit
    ProfitRelease,
    Closing,
}

impl AssetLine {
    pub const ALL: [AssetLine; 6] = [
        AssetLine::Opening,
        AssetLine::Cashflow,
        AssetLine::InvestmentIncome,
        AssetLine::Benefits,
        AssetLine::ProfitRelease,
        AssetLine::Closing,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AssetLine::Opening => "OPENING",
            AssetLine::Cashflow => "CASHFLOW",
            AssetLine::InvestmentIncome => "INV_INCOME",
            AssetLine::Benefits => "BENEFITS",
            AssetLine::ProfitRelease => "PROFIT_RELEASE",
            AssetLine::Closing => "CLOSING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_line_belongs_to_one_section() {
        let mut seen = Vec::new();
        for section in PnlSection::ALL {
            for line in section.lines() {
                assert_eq!(line.section(), section);
                assert!(!seen.contains(line));
                seen.push(*line);
            }
        }
        assert_eq!(seen.len(), 13);
    }
}
