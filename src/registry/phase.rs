//! Phase declarations
//!
//! A phase plan partitions the resolved command sequence into ordered
//! buckets; commands without an explicit phase land in the designated
//! default phase.

use crate::error::{RegistryError, RegistryResult};
use std::collections::HashSet;

/// The declared phase order and the default phase
#[derive(Debug, Clone)]
pub struct PhasePlan {
    order: Vec<String>,
    default: String,
}

impl PhasePlan {
    /// Declare the phase order; `default` must be one of the declared names
    pub fn new<S: Into<String>>(
        order: impl IntoIterator<Item = S>,
        default: &str,
    ) -> RegistryResult<Self> {
        let order: Vec<String> = order.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for phase in &order {
            if !seen.insert(phase.clone()) {
                return Err(RegistryError::DuplicatePhase(phase.clone()));
            }
        }

        if !order.iter().any(|p| p == default) {
            return Err(RegistryError::UnknownPhase {
                phase: default.to_string(),
                referenced_by: "default phase".to_string(),
            });
        }

        Ok(PhasePlan {
            order,
            default: default.to_string(),
        })
    }

    /// The declared phase names, in order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.order.iter().any(|p| p == phase)
    }

    /// Position of a phase in the declared order
    pub fn rank(&self, phase: &str) -> Option<usize> {
        self.order.iter().position(|p| p == phase)
    }

    /// Position of the default phase
    pub fn default_rank(&self) -> usize {
        // the constructor guarantees membership
        self.rank(&self.default).unwrap_or(0)
    }

    /// Validate a phase reference
    pub fn check(&self, phase: &str, referenced_by: &str) -> RegistryResult<()> {
        if self.contains(phase) {
            Ok(())
        } else {
            Err(RegistryError::UnknownPhase {
                phase: phase.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_plan_ranks() {
        let plan = PhasePlan::new(["setup", "execution", "cleanup"], "execution").unwrap();
        assert_eq!(plan.rank("setup"), Some(0));
        assert_eq!(plan.rank("cleanup"), Some(2));
        assert_eq!(plan.default_rank(), 1);
        assert!(plan.rank("missing").is_none());
    }

    #[test]
    fn test_duplicate_phase_rejected() {
        let result = PhasePlan::new(["setup", "setup"], "setup");
        assert!(matches!(result, Err(RegistryError::DuplicatePhase(_))));
    }

    #[test]
    fn test_default_must_be_declared() {
        let result = PhasePlan::new(["setup", "cleanup"], "execution");
        assert!(matches!(result, Err(RegistryError::UnknownPhase { .. })));
    }

    #[test]
    fn test_check_unknown_phase() {
        let plan = PhasePlan::new(["setup"], "setup").unwrap();
        let result = plan.check("deploy", "build");
        assert!(matches!(
            result,
            Err(RegistryError::UnknownPhase { phase, referenced_by })
                if phase == "deploy" && referenced_by == "build"
        ));
    }
}
