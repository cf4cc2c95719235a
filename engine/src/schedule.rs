//! Deadlines for the one-shot first wave and the repeating tick.

use std::time::Duration;

use corridor_defence_core::Timestamp;

/// Action whose deadline has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Due {
    FirstWave,
    Tick,
}

#[derive(Debug)]
pub(crate) struct Schedule {
    tick_interval: Duration,
    first_wave: Option<Timestamp>,
    next_tick: Option<Timestamp>,
}

impl Schedule {
    pub(crate) fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            first_wave: None,
            next_tick: None,
        }
    }

    /// Arms the first wave `first_wave_delay` after `now` and the first tick one
    /// interval after `now`.
    pub(crate) fn arm(&mut self, now: Timestamp, first_wave_delay: Duration) {
        self.first_wave = Some(now.saturating_add(first_wave_delay));
        self.next_tick = Some(now.saturating_add(self.tick_interval));
    }

    pub(crate) fn cancel(&mut self) {
        self.first_wave = None;
        self.next_tick = None;
    }

    /// Pops the earliest action due at `now`.
    ///
    /// The first wave wins over a tick with the same deadline. A tick that fell
    /// more than one interval behind is not replayed; the cadence restarts one
    /// interval after `now`.
    pub(crate) fn poll(&mut self, now: Timestamp) -> Option<Due> {
        let first_wave = self.first_wave.filter(|deadline| *deadline <= now);
        let tick = self.next_tick.filter(|deadline| *deadline <= now);

        match (first_wave, tick) {
            (Some(wave), Some(tick)) if tick < wave => {
                self.next_tick = Some(self.following_tick(tick, now));
                Some(Due::Tick)
            }
            (Some(_), _) => {
                self.first_wave = None;
                Some(Due::FirstWave)
            }
            (None, Some(tick)) => {
                self.next_tick = Some(self.following_tick(tick, now));
                Some(Due::Tick)
            }
            (None, None) => None,
        }
    }

    fn following_tick(&self, deadline: Timestamp, now: Timestamp) -> Timestamp {
        let next = deadline.saturating_add(self.tick_interval);
        if next > now {
            next
        } else {
            now.saturating_add(self.tick_interval)
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Timestamp> {
        match (self.first_wave, self.next_tick) {
            (Some(wave), Some(tick)) => Some(wave.min(tick)),
            (wave, tick) => wave.or(tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    fn drain(schedule: &mut Schedule, now: Timestamp) -> Vec<Due> {
        std::iter::from_fn(|| schedule.poll(now)).collect()
    }

    #[test]
    fn unarmed_schedule_is_idle() {
        let mut schedule = Schedule::new(Duration::from_millis(500));

        assert_eq!(schedule.poll(at(10_000)), None);
        assert_eq!(schedule.next_deadline(), None);
    }

    #[test]
    fn first_wave_runs_before_a_tick_due_at_the_same_instant() {
        let mut schedule = Schedule::new(Duration::from_millis(500));
        schedule.arm(at(0), Duration::from_millis(2_000));

        for now in [500, 1_000, 1_500] {
            assert_eq!(drain(&mut schedule, at(now)), vec![Due::Tick]);
        }
        assert_eq!(schedule.next_deadline(), Some(at(2_000)));
        assert_eq!(
            drain(&mut schedule, at(2_000)),
            vec![Due::FirstWave, Due::Tick]
        );
        assert_eq!(schedule.next_deadline(), Some(at(2_500)));
    }

    #[test]
    fn slight_lateness_keeps_the_cadence() {
        let mut schedule = Schedule::new(Duration::from_millis(500));
        schedule.arm(at(0), Duration::from_secs(60));

        assert_eq!(drain(&mut schedule, at(740)), vec![Due::Tick]);
        assert_eq!(schedule.next_deadline(), Some(at(1_000)));
    }

    #[test]
    fn missed_ticks_are_skipped_not_replayed() {
        let mut schedule = Schedule::new(Duration::from_millis(500));
        schedule.arm(at(0), Duration::from_secs(60));

        assert_eq!(drain(&mut schedule, at(3_600_000)), vec![Due::Tick, Due::FirstWave]);
        assert_eq!(schedule.next_deadline(), Some(at(3_600_500)));
    }

    #[test]
    fn cancel_clears_every_deadline() {
        let mut schedule = Schedule::new(Duration::from_millis(500));
        schedule.arm(at(0), Duration::from_millis(2_000));

        schedule.cancel();

        assert_eq!(schedule.poll(at(5_000)), None);
        assert_eq!(schedule.next_deadline(), None);
    }
}
