//! Clock & timer seam: live vs. test clock, timer/alert registration, backtest iteration.
//!
//! The engine depends only on the [`Clock`] trait; [`LiveClock`] and [`TestClock`] are the two
//! interchangeable implementations it ships with. Timers fire by invoking the registered
//! [`ClockHandler`] with a [`TimeEvent`], which the dispatcher then processes like any other
//! event.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised at the clock/timer boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("timer label '{0}' is already registered")]
    DuplicateTimer(String),
    #[error("time alert label '{0}' is already registered")]
    DuplicateTimeAlert(String),
    #[error("unknown timer or time alert label '{0}'")]
    UnknownLabel(String),
}

/// A single fired timer or time-alert, delivered to the registered [`ClockHandler`] and then
/// processed by the dispatcher as an ordinary [`Event::TimeEvent`](crate::model::event::Event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEvent {
    pub label: String,
    /// The time this event was scheduled to fire.
    pub scheduled_time: DateTime<Utc>,
}

/// Callback invoked by a [`Clock`] whenever a timer or time-alert fires.
pub type ClockHandler = Box<dyn FnMut(TimeEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Schedule {
    Timer { interval: ChronoDuration, next_fire: DateTime<Utc> },
    Alert { alert_time: DateTime<Utc> },
}

/// Live vs. test clock abstraction. The engine never calls [`Utc::now()`] directly; every
/// timestamp and every timer is sourced through this seam so that live and backtest runs share
/// identical dispatch semantics.
pub trait Clock: std::fmt::Debug {
    /// The clock's current time.
    fn time_now(&self) -> DateTime<Utc>;

    /// Registers a recurring timer under `label`, firing every `interval` from now.
    fn set_timer(&mut self, label: String, interval: ChronoDuration) -> Result<(), ClockError>;

    /// Registers a one-shot alert under `label`, firing at `alert_time`.
    fn set_time_alert(&mut self, label: String, alert_time: DateTime<Utc>) -> Result<(), ClockError>;

    /// Cancels a single timer or time-alert by label.
    fn cancel_timer(&mut self, label: &str) -> Result<(), ClockError>;

    /// Cancels every registered timer (leaving time-alerts untouched).
    fn cancel_all_timers(&mut self);

    /// Cancels every registered time-alert (leaving timers untouched).
    fn cancel_all_time_alerts(&mut self);

    /// Installs the handler invoked whenever a timer or time-alert fires.
    fn register_handler(&mut self, handler: ClockHandler);

    /// Installs a `tracing`-backed logger label used when the clock itself logs (eg/ a dropped
    /// timer fire). Default implementation is a no-op; concrete clocks that want to tag their log
    /// lines with a component name override it.
    fn register_logger(&mut self, _component: &str) {}
}

fn fire_due(schedules: &mut BTreeMap<String, Schedule>, now: DateTime<Utc>) -> Vec<TimeEvent> {
    let mut fired = Vec::new();
    let mut next_schedules = BTreeMap::new();

    for (label, schedule) in std::mem::take(schedules) {
        match schedule {
            Schedule::Alert { alert_time } if alert_time <= now => {
                fired.push((alert_time, label));
            }
            Schedule::Timer { interval, mut next_fire } => {
                while next_fire <= now {
                    fired.push((next_fire, label.clone()));
                    next_fire += interval;
                }
                next_schedules.insert(label, Schedule::Timer { interval, next_fire });
            }
            other => {
                next_schedules.insert(label, other);
            }
        }
    }

    *schedules = next_schedules;
    fired.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    fired
        .into_iter()
        .map(|(scheduled_time, label)| TimeEvent { label, scheduled_time })
        .collect()
}

/// Live clock backed by wall time. Timers are tracked deterministically but must be driven by
/// calling [`LiveClock::poll`] from the single dispatcher thread: the engine marshals all
/// external callbacks, including timer fires, onto that one thread rather than the clock spawning
/// its own.
#[derive(Default)]
pub struct LiveClock {
    schedules: BTreeMap<String, Schedule>,
    handler: Option<ClockHandler>,
}

impl std::fmt::Debug for LiveClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveClock")
            .field("schedules", &self.schedules.len())
            .field("handler_registered", &self.handler.is_some())
            .finish()
    }
}

impl LiveClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks every registered timer/time-alert against wall time and invokes the handler for
    /// each one due. Intended to be called periodically by the runtime driving the dispatcher.
    pub fn poll(&mut self) {
        let now = Utc::now();
        let fired = fire_due(&mut self.schedules, now);
        if let Some(handler) = self.handler.as_mut() {
            for event in fired {
                handler(event);
            }
        }
    }
}

impl Clock for LiveClock {
    fn time_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn set_timer(&mut self, label: String, interval: ChronoDuration) -> Result<(), ClockError> {
        if self.schedules.contains_key(&label) {
            return Err(ClockError::DuplicateTimer(label));
        }
        let next_fire = Utc::now() + interval;
        self.schedules.insert(label, Schedule::Timer { interval, next_fire });
        Ok(())
    }

    fn set_time_alert(&mut self, label: String, alert_time: DateTime<Utc>) -> Result<(), ClockError> {
        if self.schedules.contains_key(&label) {
            return Err(ClockError::DuplicateTimeAlert(label));
        }
        self.schedules.insert(label, Schedule::Alert { alert_time });
        Ok(())
    }

    fn cancel_timer(&mut self, label: &str) -> Result<(), ClockError> {
        self.schedules
            .remove(label)
            .map(|_| ())
            .ok_or_else(|| ClockError::UnknownLabel(label.to_string()))
    }

    fn cancel_all_timers(&mut self) {
        self.schedules.retain(|_, s| matches!(s, Schedule::Alert { .. }));
    }

    fn cancel_all_time_alerts(&mut self) {
        self.schedules.retain(|_, s| matches!(s, Schedule::Timer { .. }));
    }

    fn register_handler(&mut self, handler: ClockHandler) {
        self.handler = Some(handler);
    }
}

/// Deterministic virtual clock used for backtesting. Time only advances when explicitly told to,
/// via [`TestClock::set_time`] or [`TestClock::iterate_time`]; this is what makes replaying the
/// same input sequence produce bit-identical outbound command sequences.
#[derive(Default)]
pub struct TestClock {
    time: DateTime<Utc>,
    schedules: BTreeMap<String, Schedule>,
    handler: Option<ClockHandler>,
}

impl std::fmt::Debug for TestClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClock")
            .field("time", &self.time)
            .field("schedules", &self.schedules.len())
            .finish()
    }
}

impl TestClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            schedules: BTreeMap::new(),
            handler: None,
        }
    }

    /// Jumps directly to `time` without firing any timers/alerts in between. Used to seed or
    /// reposition the clock without generating spurious time events.
    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = time;
    }

    /// Advances the clock from its current time to `time`, firing (and returning) every timer and
    /// time-alert scheduled in between, in chronological order (ties broken by label).
    pub fn iterate_time(&mut self, time: DateTime<Utc>) -> Vec<TimeEvent> {
        let fired = fire_due(&mut self.schedules, time);
        self.time = time;
        if let Some(handler) = self.handler.as_mut() {
            for event in &fired {
                handler(event.clone());
            }
        }
        fired
    }
}

impl Clock for TestClock {
    fn time_now(&self) -> DateTime<Utc> {
        self.time
    }

    fn set_timer(&mut self, label: String, interval: ChronoDuration) -> Result<(), ClockError> {
        if self.schedules.contains_key(&label) {
            return Err(ClockError::DuplicateTimer(label));
        }
        let next_fire = self.time + interval;
        self.schedules.insert(label, Schedule::Timer { interval, next_fire });
        Ok(())
    }

    fn set_time_alert(&mut self, label: String, alert_time: DateTime<Utc>) -> Result<(), ClockError> {
        if self.schedules.contains_key(&label) {
            return Err(ClockError::DuplicateTimeAlert(label));
        }
        self.schedules.insert(label, Schedule::Alert { alert_time });
        Ok(())
    }

    fn cancel_timer(&mut self, label: &str) -> Result<(), ClockError> {
        self.schedules
            .remove(label)
            .map(|_| ())
            .ok_or_else(|| ClockError::UnknownLabel(label.to_string()))
    }

    fn cancel_all_timers(&mut self) {
        self.schedules.retain(|_, s| matches!(s, Schedule::Alert { .. }));
    }

    fn cancel_all_time_alerts(&mut self) {
        self.schedules.retain(|_, s| matches!(s, Schedule::Timer { .. }));
    }

    fn register_handler(&mut self, handler: ClockHandler) {
        self.handler = Some(handler);
    }
}
