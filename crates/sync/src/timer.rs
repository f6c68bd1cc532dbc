use std::collections::VecDeque;
use std::time::Duration;

/// Durations of recent synchronization ticks, checked against the tick budget.
///
/// Only the last `history` ticks are kept for the statistics; the overrun count
/// covers every tick ever recorded.
#[derive(Debug)]
pub struct TickTimer {
    budget: Duration,
    history: usize,
    recent: VecDeque<Duration>,
    overruns: u64,
}

impl TickTimer {
    pub fn new(history: usize, budget: Duration) -> Self {
        let history = history.max(1);
        Self {
            budget,
            history,
            recent: VecDeque::with_capacity(history),
            overruns: 0,
        }
    }

    /// Record one tick. Returns `true` if it took longer than the budget.
    pub fn record(&mut self, elapsed: Duration) -> bool {
        if self.recent.len() == self.history {
            self.recent.pop_front();
        }
        self.recent.push_back(elapsed);

        let overran = elapsed > self.budget;
        if overran {
            self.overruns += 1;
        }
        overran
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Ticks that exceeded the budget since this timer was created.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn average(&self) -> Duration {
        match self.recent.len() {
            0 => Duration::ZERO,
            n => self.recent.iter().sum::<Duration>() / n as u32,
        }
    }

    pub fn max(&self) -> Duration {
        self.recent.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.recent.iter().copied().min().unwrap_or_default()
    }

    /// Ticks currently held in the history window.
    pub fn count(&self) -> usize {
        self.recent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn statistics_cover_the_window() {
        let mut timer = TickTimer::new(3, ms(600));
        for n in [40, 10, 25] {
            timer.record(ms(n));
        }
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), ms(25));
        assert_eq!(timer.max(), ms(40));
        assert_eq!(timer.min(), ms(10));

        // 40 falls out of the window
        timer.record(ms(13));
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.max(), ms(25));
        assert_eq!(timer.average(), ms(16));
    }

    #[test]
    fn overruns_outlive_the_window() {
        let mut timer = TickTimer::new(1, ms(600));
        assert!(!timer.record(ms(600)));
        assert!(timer.record(ms(601)));
        assert!(!timer.record(ms(5)));
        assert_eq!(timer.overruns(), 1);
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.max(), ms(5));
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = TickTimer::new(0, ms(600));
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.average(), Duration::ZERO);
        assert_eq!(timer.min(), Duration::ZERO);
        assert_eq!(timer.overruns(), 0);
    }
}
