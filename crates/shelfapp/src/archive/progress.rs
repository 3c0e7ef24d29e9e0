/// `floor(current * 100 / total)`, with an empty job at 0%.
pub fn percent(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u128::from(current) * 100 / u128::from(total)).min(100);
    pct as u8
}

/// Decides which processed counts become visible to pollers.
#[derive(Debug, Clone, Copy)]
pub struct ProgressThrottle {
    every: u64,
    total: u64,
}

impl ProgressThrottle {
    pub fn new(every: u64, total: u64) -> Self {
        Self {
            every: every.max(1),
            total,
        }
    }

    /// Every `every`-th file, and always the last one.
    pub fn should_emit(&self, current: u64) -> bool {
        current == self.total || current % self.every == 0
    }
}
