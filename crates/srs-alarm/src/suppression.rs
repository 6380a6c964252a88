/// A single expiring suppression grant.
///
/// At most one window exists; `start` overwrites, it never stacks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuppressionWindow {
    suppressed_until_micros: Option<i64>,
}

impl SuppressionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or refresh) the window to end at `now + duration`.
    pub fn start(&mut self, now_micros: i64, duration_micros: i64) {
        let until = now_micros.saturating_add(duration_micros.max(0));
        self.suppressed_until_micros = Some(until);
    }

    /// `true` while `now < suppressed_until`.
    pub fn is_active(&self, now_micros: i64) -> bool {
        self.suppressed_until_micros
            .map(|until| now_micros < until)
            .unwrap_or(false)
    }

    /// Micros left in the window, 0 when not suppressed.
    pub fn remaining_micros(&self, now_micros: i64) -> i64 {
        match self.suppressed_until_micros {
            Some(until) if now_micros < until => until.saturating_sub(now_micros),
            _ => 0,
        }
    }

    pub fn suppressed_until_micros(&self) -> Option<i64> {
        self.suppressed_until_micros
    }

    /// Clear the window if it has elapsed at `now`.
    ///
    /// Returns `true` exactly once per window: on the call that observes
    /// `now >= suppressed_until`.
    pub fn expire(&mut self, now_micros: i64) -> bool {
        match self.suppressed_until_micros {
            Some(until) if now_micros >= until => {
                self.suppressed_until_micros = None;
                true
            }
            _ => false,
        }
    }
}
