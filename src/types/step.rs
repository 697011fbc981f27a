//! Lifecycle steps for targets and hosts.
//!
//! A `Step` records how far a record has progressed through the scan pipeline.
//! Variants are declared in pipeline order, so the derived `Ord` is the
//! lifecycle order and "advance" is a plain comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered pipeline stage of a target or host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    /// Imported by an operator, nothing run yet.
    #[default]
    Imported,
    /// Discovered live by a sweep, not yet port scanned.
    New,
    /// Host discovery has run against this target.
    Sweeped,
    /// Port scan has run against this host.
    Scanned,
    /// Service enumeration has run against this host.
    Enumerated,
    /// Device/service fingerprinting has run against this host.
    Analyzed,
}

impl Step {
    /// All steps in lifecycle order.
    pub const ALL: [Step; 6] = [
        Self::Imported,
        Self::New,
        Self::Sweeped,
        Self::Scanned,
        Self::Enumerated,
        Self::Analyzed,
    ];

    /// Returns the later of `self` and `next`.
    #[inline]
    pub fn advanced_to(self, next: Step) -> Step {
        self.max(next)
    }

    /// Upper-case tag used in storage and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imported => "IMPORTED",
            Self::New => "NEW",
            Self::Sweeped => "SWEEPED",
            Self::Scanned => "SCANNED",
            Self::Enumerated => "ENUMERATED",
            Self::Analyzed => "ANALYZED",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown step: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_order() {
        assert!(Step::Imported < Step::New);
        assert!(Step::New < Step::Sweeped);
        assert!(Step::Sweeped < Step::Scanned);
        assert!(Step::Enumerated < Step::Analyzed);
    }

    #[test]
    fn test_advance_never_regresses() {
        assert_eq!(Step::Imported.advanced_to(Step::Sweeped), Step::Sweeped);
        assert_eq!(Step::Analyzed.advanced_to(Step::Scanned), Step::Analyzed);
        assert_eq!(Step::New.advanced_to(Step::New), Step::New);
    }

    #[test]
    fn test_step_from_str() {
        assert_eq!("sweeped".parse::<Step>().unwrap(), Step::Sweeped);
        assert_eq!("IMPORTED".parse::<Step>().unwrap(), Step::Imported);
        assert!("done".parse::<Step>().is_err());
    }

    #[test]
    fn test_step_serialization() {
        let json = serde_json::to_string(&Step::Enumerated).unwrap();
        assert_eq!(json, "\"ENUMERATED\"");
    }
}
