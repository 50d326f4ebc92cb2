use serde::{Deserialize, Serialize};
use std::fmt;

/// Pages of the listing wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    PropertyDetails,
    Media,
    Financials,
    Logistics,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::PropertyDetails,
        WizardStep::Media,
        WizardStep::Financials,
        WizardStep::Logistics,
        WizardStep::Review,
    ];

    /// 1-based position shown to the seller
    pub fn number(self) -> u8 {
        match self {
            WizardStep::PropertyDetails => 1,
            WizardStep::Media => 2,
            WizardStep::Financials => 3,
            WizardStep::Logistics => 4,
            WizardStep::Review => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::PropertyDetails => "Property details",
            WizardStep::Media => "Photos & description",
            WizardStep::Financials => "Financials",
            WizardStep::Logistics => "Access & closing",
            WizardStep::Review => "Review",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_numbering() {
        assert_eq!(WizardStep::from_number(1), Some(WizardStep::PropertyDetails));
        assert_eq!(WizardStep::from_number(5), Some(WizardStep::Review));
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(6), None);
        assert_eq!(WizardStep::Logistics.next(), Some(WizardStep::Review));
        assert_eq!(WizardStep::Review.next(), None);
        assert_eq!(WizardStep::PropertyDetails.prev(), None);
    }
}
