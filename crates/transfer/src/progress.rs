/// Integer completion percentage, floored and capped at 100.
///
/// A zero `total` counts as complete.
pub fn percent(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = u128::from(received) * 100 / u128::from(total);
    pct.min(100) as u8
}

/// Produces a non-decreasing percentage sequence for one transfer.
///
/// `update` only yields a value when the percentage moved forward, so a
/// caller can forward every yielded value as an event.
#[derive(Debug, Clone)]
pub struct PercentTracker {
    total: u64,
    last: Option<u8>,
}

impl PercentTracker {
    pub fn new(total: u64) -> Self {
        Self { total, last: None }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Last percentage yielded.
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Records `received` bytes and returns the new percentage if it grew.
    pub fn update(&mut self, received: u64) -> Option<u8> {
        let pct = percent(received, self.total);
        match self.last {
            Some(prev) if pct <= prev => None,
            _ => {
                self.last = Some(pct);
                Some(pct)
            }
        }
    }
}
