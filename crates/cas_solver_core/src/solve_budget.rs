use cas_math::PolyBudget;

/// Limits for one `solve` call.
///
/// `max_depth` bounds how many invertible wrappers (`exp`, `ln`, roots, ...)
/// are peeled off while isolating a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveBudget {
    pub max_depth: usize,
    pub poly: PolyBudget,
}

impl Default for SolveBudget {
    fn default() -> Self {
        Self {
            max_depth: 6,
            poly: PolyBudget::default(),
        }
    }
}

impl SolveBudget {
    /// Check if another isolation level is allowed
    pub fn can_descend(&self) -> bool {
        self.max_depth > 0
    }

    /// Consume one isolation level, returning the remaining budget
    pub fn descend(&self) -> Self {
        Self {
            max_depth: self.max_depth.saturating_sub(1),
            poly: self.poly.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SolveBudget;

    #[test]
    fn default_budget_allows_isolation() {
        let budget = SolveBudget::default();
        assert_eq!(budget.max_depth, 6);
        assert!(budget.can_descend());
    }

    #[test]
    fn descend_saturates_at_zero() {
        let budget = SolveBudget {
            max_depth: 1,
            ..SolveBudget::default()
        };
        let next = budget.descend();
        let last = next.descend();
        assert_eq!(next.max_depth, 0);
        assert!(!next.can_descend());
        assert_eq!(last.max_depth, 0);
    }
}
