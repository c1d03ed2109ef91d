//! Demand accounting for the consumer side of a channel.

/// Amount of delivery the consumer has authorized but not yet received.
///
/// Finite demand saturates on addition; [`Demand::Unbounded`] is the sentinel
/// for consumers that opt out of backpressure entirely. Once unbounded, demand
/// stays unbounded (consumption does not decrement it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    /// Finite demand with remaining count.
    Finite(u64),
    /// Unbounded demand.
    Unbounded,
}

impl Demand {
    /// No outstanding demand.
    pub const fn none() -> Self {
        Self::Finite(0)
    }

    /// Returns `true` if the demand is unbounded.
    #[inline]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Returns `true` if at least one more delivery is authorized.
    #[inline]
    pub const fn has_demand(&self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Finite(remaining) => *remaining > 0,
        }
    }

    /// Returns the remaining finite demand, if any.
    #[inline]
    pub const fn remaining(&self) -> Option<u64> {
        match self {
            Self::Finite(value) => Some(*value),
            Self::Unbounded => None,
        }
    }

    /// Adds newly authorized demand. Saturating; unbounded absorbs everything.
    pub fn add(&mut self, amount: Demand) {
        *self = match (*self, amount) {
            (Self::Unbounded, _) | (_, Self::Unbounded) => Self::Unbounded,
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_add(b)),
        };
    }

    /// Consumes one unit of demand. Returns `false` if none remained.
    pub fn consume_one(&mut self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Finite(0) => false,
            Self::Finite(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_saturates() {
        let mut d = Demand::Finite(u64::MAX - 1);
        d.add(Demand::Finite(5));
        assert_eq!(d, Demand::Finite(u64::MAX));
    }

    #[test]
    fn test_unbounded_absorbs() {
        let mut d = Demand::Finite(3);
        d.add(Demand::Unbounded);
        assert!(d.is_unbounded());
        assert!(d.consume_one());
        assert!(d.is_unbounded());
    }

    #[test]
    fn test_consume_exhausts() {
        let mut d = Demand::Finite(2);
        assert!(d.consume_one());
        assert!(d.consume_one());
        assert!(!d.consume_one());
        assert!(!d.has_demand());
    }
}
