//! The usage tracker
//!
//! One tick is `evaluate` (night check, restart gap, cycle rollover,
//! thresholds), then a wait, then `accrue`. Every value is re-read from the
//! store on every tick; nothing is cached between ticks except what `accrue`
//! needs to know about the `evaluate` that preceded it.

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use timelimit_config::LimitsPolicy;
use timelimit_host_api::{DaylightOracle, ShutdownTrigger};
use timelimit_store::{CounterStore, StoreError};
use timelimit_util::{CounterKey, LimitKind, elapsed_between, format_duration, to_chrono};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{GapAssessment, TrackerEvent, TrackerObserver, assess_gap, cycle_expired};

const CYCLE_START: &str = CounterKey::CycleStart.as_str();
const CYCLE_USED: &str = CounterKey::SinceTheBeginningOfTheCycle.as_str();
const LAST_TIME_ON: &str = CounterKey::LastTimeOn.as_str();
const SESSION_USED: &str = CounterKey::SinceTheStartOfTheSession.as_str();

/// Tracker errors
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Counter store failed: {0}")]
    Store(#[from] StoreError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Why the tracker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A budget is used up; the machine is being shut down
    LimitReached(LimitKind),
    /// Outside daylight
    NightCutoff,
    /// Interrupted from outside
    Cancelled,
}

impl StopReason {
    pub fn requests_shutdown(&self) -> bool {
        matches!(self, StopReason::LimitReached(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::LimitReached(limit) => write!(f, "{limit} limit reached"),
            StopReason::NightCutoff => f.write_str("night cutoff"),
            StopReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Outcome of [`UsageTracker::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop(StopReason),
}

/// Snapshot of the counters against the budgets
#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    pub cycle_start: DateTime<Local>,
    pub cycle_ends_at: DateTime<Local>,
    pub cycle_used: Duration,
    pub cycle_remaining: Duration,
    pub session_used: Duration,
    pub session_remaining: Duration,
    pub last_time_on: DateTime<Local>,
}

/// What `evaluate` saw that `accrue` needs
#[derive(Debug, Clone, Copy)]
struct TickContext {
    last_time_on: DateTime<Local>,
    restarted: bool,
}

/// Gap-aware accounting of on-time against the session and cycle budgets
pub struct UsageTracker {
    limits: LimitsPolicy,
    store: Arc<dyn CounterStore>,
    shutdown: Arc<dyn ShutdownTrigger>,
    daylight: Option<Arc<dyn DaylightOracle>>,
    observer: Arc<dyn TrackerObserver>,
    tick: Option<TickContext>,
}

impl UsageTracker {
    pub fn new(
        limits: LimitsPolicy,
        store: Arc<dyn CounterStore>,
        shutdown: Arc<dyn ShutdownTrigger>,
        daylight: Option<Arc<dyn DaylightOracle>>,
        observer: Arc<dyn TrackerObserver>,
    ) -> Self {
        info!(
            interval = %format_duration(limits.check_interval),
            session = %format_duration(limits.allowed_session),
            cycle = %format_duration(limits.allowed_cycle),
            cycle_length = %format_duration(limits.cycle_length),
            rest = %format_duration(limits.necessary_rest),
            night_cutoff = daylight.is_some(),
            "Usage tracker initialized"
        );

        Self {
            limits,
            store,
            shutdown,
            daylight,
            observer,
            tick: None,
        }
    }

    /// Decide whether monitoring continues at `now`.
    ///
    /// Applies the night check, restart-gap compensation and cycle rollover,
    /// persisting each adjustment as it is made, then checks both budgets.
    pub fn evaluate(&mut self, now: DateTime<Local>) -> TrackerResult<Verdict> {
        if let Some(daylight) = &self.daylight
            && daylight.is_outside_daylight(now)
        {
            self.observer.on_event(&TrackerEvent::NightCutoff);
            return Ok(Verdict::Stop(StopReason::NightCutoff));
        }

        let session = self.apply_gap(now)?;
        self.roll_cycle(now)?;
        let cycle = self.store.read_duration(CYCLE_USED)?;

        debug!(
            session = %format_duration(session),
            cycle = %format_duration(cycle),
            "Counters evaluated"
        );

        // Both are checked so both get reported; the session limit wins
        let mut breached = None;
        for (limit, used, allowed) in [
            (LimitKind::Session, session, self.limits.allowed_session),
            (LimitKind::Cycle, cycle, self.limits.allowed_cycle),
        ] {
            if used >= allowed {
                self.observer.on_event(&TrackerEvent::LimitReached {
                    limit,
                    used,
                    allowed,
                });
                breached.get_or_insert(limit);
            }
        }

        Ok(match breached {
            Some(limit) => Verdict::Stop(StopReason::LimitReached(limit)),
            None => Verdict::Continue,
        })
    }

    /// Add one poll interval to both accumulators, completing a tick.
    ///
    /// `last_time_on` moves to `now` only if the tick that was evaluated
    /// was a restart, or if `now` is within the liveness threshold of the
    /// `last_time_on` seen then. A tick that ran late (machine suspended
    /// during the wait) leaves it behind so the next evaluation treats the
    /// delay as a gap.
    pub fn accrue(&mut self, now: DateTime<Local>) -> TrackerResult<()> {
        let tick = match self.tick.take() {
            Some(tick) => tick,
            None => TickContext {
                last_time_on: self.store.read_timestamp(LAST_TIME_ON, now)?,
                restarted: false,
            },
        };

        let interval = self.limits.check_interval;
        let cycle = self.store.increment(CYCLE_USED, interval)?;
        let session = self.store.increment(SESSION_USED, interval)?;

        let since_last = elapsed_between(tick.last_time_on, now);
        if tick.restarted || since_last < self.limits.liveness_threshold() {
            self.store.write_timestamp(LAST_TIME_ON, now)?;
        } else {
            debug!(
                since_last = %format_duration(since_last),
                "Tick ran late, keeping last_time_on"
            );
        }

        debug!(
            session = %format_duration(session),
            cycle = %format_duration(cycle),
            "Accrued"
        );
        Ok(())
    }

    /// Tick until a stop condition or cancellation.
    ///
    /// A limit verdict requests the shutdown before returning. Cancellation
    /// is only observed while waiting for the next tick and never requests it.
    pub async fn run(&mut self, cancel: CancellationToken) -> TrackerResult<StopReason> {
        let period = self.limits.check_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if let Verdict::Stop(reason) = self.evaluate(timelimit_util::now())? {
                if reason.requests_shutdown() {
                    self.observer.on_event(&TrackerEvent::ShutdownRequested);
                    self.shutdown.request_shutdown();
                }
                return Ok(reason);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Cancelled, stopping without shutdown");
                    return Ok(StopReason::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            self.accrue(timelimit_util::now())?;
        }
    }

    /// Read the counters as stored, without applying any tick logic
    pub fn report(&self, now: DateTime<Local>) -> TrackerResult<UsageReport> {
        let cycle_start = self.store.read_timestamp(CYCLE_START, now)?;
        let cycle_used = self.store.read_duration(CYCLE_USED)?;
        let session_used = self.store.read_duration(SESSION_USED)?;
        let last_time_on = self.store.read_timestamp(LAST_TIME_ON, now)?;

        Ok(UsageReport {
            cycle_start,
            cycle_ends_at: cycle_start
                .checked_add_signed(to_chrono(self.limits.cycle_length))
                .unwrap_or(cycle_start),
            cycle_used,
            cycle_remaining: self.limits.allowed_cycle.saturating_sub(cycle_used),
            session_used,
            session_remaining: self.limits.allowed_session.saturating_sub(session_used),
            last_time_on,
        })
    }

    /// Restart-gap compensation. Returns the session accumulator after it.
    fn apply_gap(&mut self, now: DateTime<Local>) -> TrackerResult<Duration> {
        let session = self.store.read_duration(SESSION_USED)?;
        let last_time_on = self.store.read_timestamp(LAST_TIME_ON, now)?;
        let gap = elapsed_between(last_time_on, now);
        let assessment = assess_gap(gap, &self.limits);

        self.tick = Some(TickContext {
            last_time_on,
            restarted: assessment.is_restart(),
        });

        if !assessment.is_restart() {
            return Ok(session);
        }

        self.observer
            .on_event(&TrackerEvent::RestartDetected { last_time_on, gap });

        let adjusted = assessment.apply(session);
        match assessment {
            GapAssessment::FullRest => self
                .observer
                .on_event(&TrackerEvent::SessionReset { previous: session }),
            GapAssessment::PartialRest { credit } => {
                self.observer.on_event(&TrackerEvent::SessionCredited {
                    credit,
                    remaining: adjusted,
                })
            }
            GapAssessment::Live | GapAssessment::ShortAbsence => {}
        }

        self.store.write_duration(SESSION_USED, adjusted)?;
        Ok(adjusted)
    }

    fn roll_cycle(&self, now: DateTime<Local>) -> TrackerResult<()> {
        let cycle_start = self.store.read_timestamp(CYCLE_START, now)?;
        if !cycle_expired(elapsed_between(cycle_start, now), &self.limits) {
            return Ok(());
        }

        let used = self.store.read_duration(CYCLE_USED)?;
        self.store.write_timestamp(CYCLE_START, now)?;
        self.store.write_duration(CYCLE_USED, Duration::ZERO)?;

        self.observer.on_event(&TrackerEvent::CycleReset {
            previous_start: cycle_start,
            used,
        });
        Ok(())
    }
}
