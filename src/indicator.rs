/// "Working" row shown while a request is in flight.
use std::time::Duration;

use crate::timer::{Scheduler, TimerHandle, TimerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    One,
    Two,
    Three,
}

impl IndicatorState {
    pub fn next(self) -> Self {
        match self {
            IndicatorState::One => IndicatorState::Two,
            IndicatorState::Two => IndicatorState::Three,
            IndicatorState::Three => IndicatorState::One,
        }
    }
}

pub struct TypingIndicator {
    period: Duration,
    state: Option<IndicatorState>,
    timer: Option<TimerHandle>,
}

impl TypingIndicator {
    pub fn new(period: Duration) -> Self {
        Self { period, state: None, timer: None }
    }

    /// Insert the row (replacing any existing one) and start cycling.
    pub fn show(&mut self, scheduler: &dyn Scheduler) {
        if let Some(prev) = self.timer.take() {
            prev.cancel();
        }
        self.state = Some(IndicatorState::One);
        self.timer = Some(scheduler.every(TimerKind::Indicator, self.period));
    }

    /// Cancel the cycle and remove the row. No-op when hidden.
    pub fn hide(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.state = None;
    }

    pub fn advance(&mut self) {
        if let Some(state) = &mut self.state {
            *state = state.next();
        }
    }

    pub fn state(&self) -> Option<IndicatorState> {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::manual::ManualScheduler;

    #[test]
    fn test_cycles_through_three_states() {
        let sched = ManualScheduler::default();
        let mut ind = TypingIndicator::new(Duration::from_secs(2));
        ind.show(&sched);
        assert_eq!(ind.state(), Some(IndicatorState::One));
        ind.advance();
        assert_eq!(ind.state(), Some(IndicatorState::Two));
        ind.advance();
        assert_eq!(ind.state(), Some(IndicatorState::Three));
        ind.advance();
        assert_eq!(ind.state(), Some(IndicatorState::One));
    }

    #[test]
    fn test_show_twice_keeps_one_timer() {
        let sched = ManualScheduler::default();
        let mut ind = TypingIndicator::new(Duration::from_secs(2));
        ind.show(&sched);
        ind.show(&sched);
        assert_eq!(sched.live(), 1);
        ind.hide();
        assert_eq!(sched.live(), 0);
        assert!(!ind.is_visible());
    }

    #[test]
    fn test_hide_when_hidden_and_advance_when_hidden() {
        let mut ind = TypingIndicator::new(Duration::from_secs(2));
        ind.hide();
        ind.advance();
        assert_eq!(ind.state(), None);
    }
}
