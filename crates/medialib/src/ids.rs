use crate::IndexError;

/// Session-wide source of node and item row ids.
///
/// Zero is never issued; registration treats a zero "desired" id as a
/// request for a fresh one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowIds {
    last: u64,
}

impl RowIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn mint(&mut self) -> Result<u64, IndexError> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or(IndexError::RowIdsExhausted)?;
        Ok(self.last)
    }

    /// Hands back `desired` when it is non-zero, otherwise a fresh id.
    pub fn take(&mut self, desired: u64) -> Result<u64, IndexError> {
        if desired == 0 {
            return self.mint();
        }
        if desired > self.last {
            self.last = desired;
        }
        Ok(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::RowIds;
    use crate::IndexError;

    #[test]
    fn mint_starts_at_one() {
        let mut ids = RowIds::new();
        assert_eq!(ids.mint().unwrap(), 1);
        assert_eq!(ids.mint().unwrap(), 2);
        assert_eq!(ids.last(), 2);
    }

    #[test]
    fn take_prefers_desired_id() {
        let mut ids = RowIds::starting_after(10);
        assert_eq!(ids.take(4).unwrap(), 4);
        assert_eq!(ids.take(0).unwrap(), 11);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut ids = RowIds::starting_after(u64::MAX);
        assert!(matches!(ids.mint(), Err(IndexError::RowIdsExhausted)));
    }
}
