//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold within the failure window
//! Open → Half-Open: after the cooldown
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - Per-service circuit breaker (not global, not per instance)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in Half-Open (prevents hammering recovering backend)
//! - A probe that never reports back stops blocking after one cooldown

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;
use crate::routing::ServiceKind;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    /// First failure of the current streak while closed.
    streak_started: Option<Instant>,
    opened_at: Option<Instant>,
    /// Set while the half-open probe is in flight.
    probe_started: Option<Instant>,
}

impl Inner {
    fn reset(&mut self) {
        self.state = BreakerState::Closed;
        self.consecutive_failures = 0;
        self.streak_started = None;
        self.opened_at = None;
        self.probe_started = None;
    }

    fn open(&mut self, now: Instant) {
        self.state = BreakerState::Open;
        self.opened_at = Some(now);
        self.probe_started = None;
    }
}

/// Failure-tracking state machine for one service.
#[derive(Debug)]
pub struct CircuitBreaker {
    service: ServiceKind,
    failure_threshold: u32,
    cooldown: Duration,
    failure_window: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(service: ServiceKind, config: &CircuitBreakerConfig) -> Self {
        Self {
            service,
            failure_threshold: config.failure_threshold.max(1),
            cooldown: config.cooldown(),
            failure_window: config.failure_window(),
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                streak_started: None,
                opened_at: None,
                probe_started: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a backend call may be issued now.
    ///
    /// In half-open state this admits exactly one caller; everyone else is
    /// rejected until that probe reports back.
    pub fn allow(&self) -> bool {
        let mut inner = self.lock();
        let now = Instant::now();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .is_some_and(|opened| now.duration_since(opened) >= self.cooldown);
                if cooled {
                    inner.state = BreakerState::HalfOpen;
                    inner.probe_started = Some(now);
                    tracing::info!(service = %self.service, "Circuit half-open, admitting probe");
                }
                cooled
            }
            BreakerState::HalfOpen => match inner.probe_started {
                Some(started) if now.duration_since(started) < self.cooldown => false,
                _ => {
                    inner.probe_started = Some(now);
                    true
                }
            },
        }
    }

    /// Hand back a half-open probe that was admitted but never sent.
    pub fn release_probe(&self) {
        let mut inner = self.lock();
        if inner.state == BreakerState::HalfOpen {
            inner.probe_started = None;
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.reset();
                tracing::info!(service = %self.service, "Probe succeeded, circuit closed");
            }
            BreakerState::Closed => {
                inner.consecutive_failures = 0;
                inner.streak_started = None;
            }
            // Late success from a call admitted before the circuit opened.
            BreakerState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        match inner.state {
            BreakerState::Closed => {
                let stale = inner
                    .streak_started
                    .is_some_and(|started| now.duration_since(started) >= self.failure_window);
                if stale {
                    inner.consecutive_failures = 0;
                    inner.streak_started = None;
                }
                if inner.consecutive_failures == 0 {
                    inner.streak_started = Some(now);
                }
                inner.consecutive_failures += 1;

                if inner.consecutive_failures >= self.failure_threshold {
                    inner.open(now);
                    tracing::warn!(
                        service = %self.service,
                        failures = inner.consecutive_failures,
                        cooldown = ?self.cooldown,
                        "Circuit opened"
                    );
                }
            }
            BreakerState::HalfOpen => {
                inner.open(now);
                tracing::warn!(service = %self.service, "Probe failed, circuit re-opened");
            }
            BreakerState::Open => {}
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }
}

/// One breaker per service.
#[derive(Debug)]
pub struct CircuitBreakers {
    account: CircuitBreaker,
    template: CircuitBreaker,
}

impl CircuitBreakers {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            account: CircuitBreaker::new(ServiceKind::Account, config),
            template: CircuitBreaker::new(ServiceKind::Template, config),
        }
    }

    pub fn for_service(&self, service: ServiceKind) -> &CircuitBreaker {
        match service {
            ServiceKind::Account => &self.account,
            ServiceKind::Template => &self.template,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CircuitBreaker> {
        ServiceKind::ALL.into_iter().map(|kind| self.for_service(kind))
    }
}
