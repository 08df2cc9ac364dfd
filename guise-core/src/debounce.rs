//! Trailing-edge debounce for preview recomputation.

use std::time::{Duration, Instant};

use guise_types::ControlKind;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Debouncer {
    range: Duration,
    text: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(range: Duration, text: Duration) -> Self {
        Self {
            range,
            text,
            deadline: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.range_debounce(), config.text_debounce())
    }

    /// Quiet period for a control kind; zero for discrete controls.
    pub fn window(&self, control: ControlKind) -> Duration {
        match control {
            ControlKind::Range => self.range,
            ControlKind::Text => self.text,
            ControlKind::Discrete => Duration::ZERO,
        }
    }

    /// Record an edit at `now`. Returns true when the caller should
    /// recompute right away; otherwise the recompute waits for [`Self::due`].
    pub fn schedule(&mut self, control: ControlKind, now: Instant) -> bool {
        let window = self.window(control);
        if window.is_zero() {
            self.deadline = None;
            return true;
        }
        self.deadline = Some(now + window);
        false
    }

    /// True once the quiet period has passed; clears the pending deadline.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> Debouncer {
        Debouncer::new(Duration::from_millis(50), Duration::from_millis(200))
    }

    #[test]
    fn discrete_is_immediate() {
        let mut d = debouncer();
        let now = Instant::now();
        d.schedule(ControlKind::Text, now);
        assert!(d.schedule(ControlKind::Discrete, now));
        assert!(!d.is_pending());
    }

    #[test]
    fn range_waits_for_quiet_period() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert!(!d.schedule(ControlKind::Range, t0));
        assert!(!d.due(t0 + Duration::from_millis(49)));
        assert!(d.due(t0 + Duration::from_millis(50)));
        assert!(!d.due(t0 + Duration::from_millis(60)));
    }

    #[test]
    fn new_edit_pushes_deadline_back() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.schedule(ControlKind::Text, t0);
        d.schedule(ControlKind::Text, t0 + Duration::from_millis(150));
        assert!(!d.due(t0 + Duration::from_millis(210)));
        assert!(d.due(t0 + Duration::from_millis(350)));
    }
}
