//! Click counting for multi-click placement.

/// Counts clicks until a placement has enough of them.
///
/// A region needs two clicks: the first one anchors a corner, the second one
/// completes it. The counter lives in memory only and is reset whenever a
/// placement is abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickCounter {
    count: u32,
}

impl ClickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a click and return the running count.
    pub fn click(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    /// Register a click; true (and reset) when the count reaches `required`.
    pub fn has_enough_clicks(&mut self, required: u32) -> bool {
        if self.click() == required {
            self.reset();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clicks_then_reset() {
        let mut counter = ClickCounter::new();
        assert!(!counter.has_enough_clicks(2));
        assert!(counter.has_enough_clicks(2));
        assert_eq!(counter.count(), 0);
        assert!(!counter.has_enough_clicks(2));
    }

    #[test]
    fn test_single_click_placement() {
        let mut counter = ClickCounter::new();
        assert!(counter.has_enough_clicks(1));
        assert!(counter.has_enough_clicks(1));
    }

    #[test]
    fn test_click_and_reset() {
        let mut counter = ClickCounter::new();
        assert_eq!(counter.click(), 1);
        assert_eq!(counter.click(), 2);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }
}
