use serde::{Deserialize, Serialize};

/// Upload progress for a visit that carries a request body.
///
/// The dispatcher forwards these verbatim while a visit is in flight; the
/// form layer mirrors the most recent one into its state and clears it when
/// the visit settles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Bytes transferred so far.
    pub loaded: u64,
    /// Total bytes, when the transport knows it up front.
    pub total: Option<u64>,
}

impl Progress {
    /// Create a progress event.
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Self { loaded, total }
    }

    /// Completion as a rounded percentage, when the total is known and
    /// non-zero.
    pub fn percentage(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => {
                let loaded = self.loaded.min(total) as u128;
                Some(((loaded * 100 + total as u128 / 2) / total as u128) as u8)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds() {
        assert_eq!(Progress::new(1, Some(3)).percentage(), Some(33));
        assert_eq!(Progress::new(2, Some(3)).percentage(), Some(67));
        assert_eq!(Progress::new(3, Some(3)).percentage(), Some(100));
    }

    #[test]
    fn percentage_needs_a_total() {
        assert_eq!(Progress::new(10, None).percentage(), None);
        assert_eq!(Progress::new(10, Some(0)).percentage(), None);
    }

    #[test]
    fn overshoot_clamps() {
        assert_eq!(Progress::new(12, Some(10)).percentage(), Some(100));
    }
}
