use std::fmt;

/// Quantity of claim units, the abstract currency spent per claim.
///
/// Costs and balances are whole non-negative units; there is no fractional
/// or negative quantity anywhere in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Points(u64);

impl Points {
    pub const fn new(value: u64) -> Self {
        Points(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Affordability check: can a balance of `self` pay `cost`?
    pub fn covers(self, cost: Points) -> bool {
        self.0 >= cost.0
    }

    /// Display-only balance after paying `cost` (saturating at zero).
    ///
    /// The engine never deducts from a real balance; callers use this to
    /// render an "after claiming" preview.
    pub fn remaining_after(self, cost: Points) -> Points {
        Points(self.0.saturating_sub(cost.0))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Points {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Points(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_preserves_value() {
        assert_eq!(Points::new(420).get(), 420);
    }

    #[test]
    fn default_is_zero() {
        assert_eq!(Points::default(), Points::new(0));
    }

    #[test]
    fn covers_boundary() {
        let balance = Points::new(100);
        assert!(balance.covers(Points::new(99)));
        assert!(balance.covers(Points::new(100)));
        assert!(!balance.covers(Points::new(101)));
    }

    #[test]
    fn zero_balance_covers_only_zero() {
        assert!(Points::new(0).covers(Points::new(0)));
        assert!(!Points::new(0).covers(Points::new(1)));
    }

    #[test]
    fn remaining_after_subtracts() {
        assert_eq!(
            Points::new(100).remaining_after(Points::new(30)),
            Points::new(70)
        );
    }

    #[test]
    fn remaining_after_saturates_at_zero() {
        assert_eq!(
            Points::new(10).remaining_after(Points::new(50)),
            Points::new(0)
        );
    }

    #[test]
    fn display_is_plain_integer() {
        assert_eq!(Points::new(0).to_string(), "0");
        assert_eq!(Points::new(1500).to_string(), "1500");
    }

    #[test]
    fn add() {
        assert_eq!(Points::new(100) + Points::new(50), Points::new(150));
    }

    #[test]
    fn add_assign() {
        let mut p = Points::new(100);
        p += Points::new(50);
        assert_eq!(p, Points::new(150));
    }

    #[test]
    fn ordering() {
        assert!(Points::new(5) < Points::new(25));
        assert!(Points::new(25) > Points::new(5));
    }
}
