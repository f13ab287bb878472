//! Ratio simulator
//!
//! Each endpoint owns a call counter cycling through `[0, cycle_length)`.
//! The outcome of a call is a pure function of the counter position *before*
//! the call advances it: position `p` fails iff
//! `floor((p + 1) * failures / cycle_length) > floor(p * failures / cycle_length)`.
//!
//! This spreads failures evenly over the cycle and always places one on the
//! last position, so with a single failure per cycle every K-th call fails and
//! the first call of a fresh process succeeds.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use super::registry::{EndpointId, EndpointRegistry};

/// Denominator used when turning a fractional success ratio into a cycle
const RATIO_RESOLUTION: u32 = 1000;

/// Outcome selected for a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    SimulatedFailure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::SimulatedFailure => "simulated_failure",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RatioError {
    #[error("cycle length must be at least 1")]
    EmptyCycle,

    #[error("{failures} failures do not fit in a cycle of {cycle_length}")]
    TooManyFailures { failures: u32, cycle_length: u32 },

    #[error("success ratio must be in (0, 1], got {0}")]
    OutOfRange(f64),
}

/// `failures` simulated failures in every `cycle_length` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    cycle_length: u32,
    failures: u32,
}

impl Ratio {
    pub const ALWAYS_SUCCEED: Ratio = Ratio {
        cycle_length: 1,
        failures: 0,
    };

    pub fn new(cycle_length: u32, failures: u32) -> Result<Self, RatioError> {
        if cycle_length == 0 {
            return Err(RatioError::EmptyCycle);
        }
        if failures > cycle_length {
            return Err(RatioError::TooManyFailures {
                failures,
                cycle_length,
            });
        }
        Ok(Self {
            cycle_length,
            failures,
        })
    }

    /// Convert a success ratio in (0, 1] into the smallest equivalent cycle.
    ///
    /// The ratio is rounded to a multiple of 1/1000: `0.5` is one failure in 2
    /// calls, `0.75` one in 4, `0.3` seven in 10.
    pub fn from_success_ratio(success_ratio: f64) -> Result<Self, RatioError> {
        if !success_ratio.is_finite() || success_ratio <= 0.0 || success_ratio > 1.0 {
            return Err(RatioError::OutOfRange(success_ratio));
        }

        let failures = ((1.0 - success_ratio) * f64::from(RATIO_RESOLUTION)).round() as u32;
        if failures == 0 {
            return Ok(Self::ALWAYS_SUCCEED);
        }

        let divisor = gcd(failures, RATIO_RESOLUTION);
        Self::new(RATIO_RESOLUTION / divisor, failures / divisor)
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn success_ratio(&self) -> f64 {
        f64::from(self.cycle_length - self.failures) / f64::from(self.cycle_length)
    }

    /// Outcome for a call observed at `position` (taken modulo the cycle)
    pub fn outcome_at(&self, position: u32) -> Outcome {
        let position = u64::from(position % self.cycle_length);
        let cycle = u64::from(self.cycle_length);
        let failures = u64::from(self.failures);

        if (position + 1) * failures / cycle > position * failures / cycle {
            Outcome::SimulatedFailure
        } else {
            Outcome::Success
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Mutable per-endpoint state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounter {
    total_calls: u64,
    position: u32,
}

impl CallCounter {
    /// Decide the outcome for the current position, then advance
    pub fn advance(&mut self, ratio: &Ratio) -> Outcome {
        let outcome = ratio.outcome_at(self.position);
        self.position = (self.position + 1) % ratio.cycle_length();
        self.total_calls = self.total_calls.saturating_add(1);
        outcome
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub fn position(&self) -> u32 {
        self.position
    }
}

/// Read-only view of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub total_calls: u64,
    pub position: u32,
}

struct EndpointCounter {
    ratio: Ratio,
    counter: Mutex<CallCounter>,
}

/// Owns one synchronized counter per registered endpoint.
///
/// Counters are indexed by `EndpointId`; two calls to the same endpoint are
/// serialized, calls to different endpoints never contend.
pub struct RatioSimulator {
    counters: Vec<EndpointCounter>,
}

impl RatioSimulator {
    pub fn new(registry: &EndpointRegistry) -> Self {
        let counters = registry
            .iter()
            .map(|(_, endpoint)| EndpointCounter {
                ratio: endpoint.ratio,
                counter: Mutex::new(CallCounter::default()),
            })
            .collect();

        Self { counters }
    }

    /// Pick the outcome of one call and advance the endpoint's counter.
    ///
    /// Returns `None` for an id this simulator was not built with.
    pub fn next_outcome(&self, id: EndpointId) -> Option<Outcome> {
        let slot = self.counters.get(id.index())?;
        let mut counter = lock(&slot.counter);
        let position = counter.position();
        let outcome = counter.advance(&slot.ratio);

        trace!(
            endpoint_id = id.index(),
            position,
            total_calls = counter.total_calls(),
            outcome = outcome.as_str(),
            "Outcome selected"
        );

        Some(outcome)
    }

    pub fn snapshot(&self, id: EndpointId) -> Option<CounterSnapshot> {
        let slot = self.counters.get(id.index())?;
        let counter = lock(&slot.counter);
        Some(CounterSnapshot {
            total_calls: counter.total_calls(),
            position: counter.position(),
        })
    }
}

// Every critical section leaves the counter valid, so a poisoned lock is still usable
fn lock(counter: &Mutex<CallCounter>) -> MutexGuard<'_, CallCounter> {
    counter.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
