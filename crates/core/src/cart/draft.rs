use super::model::clamp_quantity;

/// Buffered quantity edit for one cart line.
///
/// The editor changes the draft freely; nothing is written until the
/// shopper confirms, and confirming only matters when the draft differs
/// from the persisted count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityDraft {
    draft: u32,
    persisted: u32,
    max: u32,
}

impl QuantityDraft {
    #[must_use]
    pub fn new(persisted: u32, stock: u32) -> Self {
        Self {
            draft: clamp_quantity(i64::from(persisted), stock),
            persisted,
            max: stock.max(1),
        }
    }

    /// Apply typed input. Empty, non-numeric or values below 1 become 1;
    /// values above stock, however long, become stock.
    pub fn input(&mut self, raw: &str) {
        let raw = raw.trim();
        let requested = raw.parse::<i64>().unwrap_or_else(|_| {
            if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
                i64::MAX
            } else {
                1
            }
        });
        self.set(requested);
    }

    pub fn set(&mut self, requested: i64) {
        self.draft = clamp_quantity(requested, self.max);
    }

    pub fn increment(&mut self) {
        self.set(i64::from(self.draft) + 1);
    }

    pub fn decrement(&mut self) {
        self.set(i64::from(self.draft) - 1);
    }

    #[must_use]
    pub const fn draft(&self) -> u32 {
        self.draft
    }

    #[must_use]
    pub const fn persisted(&self) -> u32 {
        self.persisted
    }

    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Whether confirming would write anything.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.draft != self.persisted
    }

    /// Reset to a new persisted count, dropping any pending edit.
    pub fn sync(&mut self, persisted: u32) {
        self.persisted = persisted;
        self.draft = clamp_quantity(i64::from(persisted), self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_normalization() {
        let mut draft = QuantityDraft::new(2, 5);
        draft.input("");
        assert_eq!(draft.draft(), 1);
        draft.input("abc");
        assert_eq!(draft.draft(), 1);
        draft.input("-4");
        assert_eq!(draft.draft(), 1);
        draft.input("0");
        assert_eq!(draft.draft(), 1);
        draft.input(" 4 ");
        assert_eq!(draft.draft(), 4);
        draft.input("40");
        assert_eq!(draft.draft(), 5);
    }

    #[test]
    fn test_oversized_input_clamps_to_stock() {
        let mut draft = QuantityDraft::new(2, 5);
        draft.input("99999999999999999999");
        assert_eq!(draft.draft(), 5);
        draft.input("-99999999999999999999");
        assert_eq!(draft.draft(), 1);
        draft.input("12a");
        assert_eq!(draft.draft(), 1);
    }

    #[test]
    fn test_dirty_only_when_changed() {
        let mut draft = QuantityDraft::new(3, 5);
        assert!(!draft.is_dirty());
        draft.increment();
        assert!(draft.is_dirty());
        draft.decrement();
        assert!(!draft.is_dirty());
    }

    #[test]
    fn test_bounds_on_step() {
        let mut draft = QuantityDraft::new(1, 2);
        draft.decrement();
        assert_eq!(draft.draft(), 1);
        draft.increment();
        draft.increment();
        assert_eq!(draft.draft(), 2);
    }

    #[test]
    fn test_sync_drops_pending_edit() {
        let mut draft = QuantityDraft::new(1, 9);
        draft.input("7");
        draft.sync(3);
        assert_eq!(draft.draft(), 3);
        assert!(!draft.is_dirty());
    }
}
