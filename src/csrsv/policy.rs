use crate::SparseError;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Treatment of an existing analysis when analysis is requested again.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnalysisPolicy {
    /// Keep an existing analysis, or share a compatible one computed by
    /// another routine.   The caller asserts the sparsity pattern has not
    /// changed since it was built.
    #[default]
    Reuse,
    /// Always discard and rebuild
    Force,
}

/// Scheduling strategy of the solve kernels.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolvePolicy {
    #[default]
    Auto,
}

impl FromStr for AnalysisPolicy {
    type Err = SparseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reuse" => Ok(AnalysisPolicy::Reuse),
            "force" => Ok(AnalysisPolicy::Force),
            _ => Err(SparseError::InvalidValue("analysis")),
        }
    }
}

impl FromStr for SolvePolicy {
    type Err = SparseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SolvePolicy::Auto),
            _ => Err(SparseError::InvalidValue("solve")),
        }
    }
}

impl std::fmt::Display for AnalysisPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisPolicy::Reuse => write!(f, "reuse"),
            AnalysisPolicy::Force => write!(f, "force"),
        }
    }
}

impl std::fmt::Display for SolvePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "auto")
    }
}

#[test]
fn test_policy_from_str() {
    assert_eq!("force".parse::<AnalysisPolicy>(), Ok(AnalysisPolicy::Force));
    assert_eq!("reuse".parse::<AnalysisPolicy>(), Ok(AnalysisPolicy::Reuse));
    assert_eq!(
        "sometimes".parse::<AnalysisPolicy>(),
        Err(SparseError::InvalidValue("analysis"))
    );
    assert_eq!("auto".parse::<SolvePolicy>(), Ok(SolvePolicy::Auto));
    assert!("levels".parse::<SolvePolicy>().is_err());
    assert_eq!(AnalysisPolicy::Force.to_string(), "force");
}
