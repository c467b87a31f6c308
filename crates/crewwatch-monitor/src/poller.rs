use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

use crewwatch_core::model::Endpoint;

/// What to do when an endpoint's timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Issue,
    /// The previous fetch is still outstanding.
    Skip,
}

/// What to do when a refresh is forced outside the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceDecision {
    IssueNow,
    /// Issued as soon as the outstanding fetch completes, so the refresh
    /// never reads state older than the force request.
    Queued,
}

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    in_flight: bool,
    refresh_queued: bool,
    issued: u64,
    skipped: u64,
}

/// Per-endpoint fetch bookkeeping. At most one fetch per endpoint is ever
/// outstanding.
#[derive(Debug, Default)]
pub struct Poller {
    slots: [Slot; 3],
}

fn index(endpoint: Endpoint) -> usize {
    match endpoint {
        Endpoint::Agents => 0,
        Endpoint::CrewStatus => 1,
        Endpoint::CrewStats => 2,
    }
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tick(&mut self, endpoint: Endpoint) -> TickDecision {
        let slot = &mut self.slots[index(endpoint)];
        if slot.in_flight {
            slot.skipped += 1;
            return TickDecision::Skip;
        }
        slot.in_flight = true;
        slot.issued += 1;
        TickDecision::Issue
    }

    pub fn on_force(&mut self, endpoint: Endpoint) -> ForceDecision {
        let slot = &mut self.slots[index(endpoint)];
        if slot.in_flight {
            slot.refresh_queued = true;
            return ForceDecision::Queued;
        }
        slot.in_flight = true;
        slot.issued += 1;
        ForceDecision::IssueNow
    }

    /// Record that the outstanding fetch finished. Returns true when a queued
    /// refresh must be issued right away; the slot stays in flight for it.
    pub fn on_complete(&mut self, endpoint: Endpoint) -> bool {
        let slot = &mut self.slots[index(endpoint)];
        if slot.refresh_queued {
            slot.refresh_queued = false;
            slot.issued += 1;
            return true;
        }
        slot.in_flight = false;
        false
    }

    pub fn is_in_flight(&self, endpoint: Endpoint) -> bool {
        self.slots[index(endpoint)].in_flight
    }

    pub fn issued(&self, endpoint: Endpoint) -> u64 {
        self.slots[index(endpoint)].issued
    }

    pub fn skipped(&self, endpoint: Endpoint) -> u64 {
        self.slots[index(endpoint)].skipped
    }
}

/// The three independent poll timers.
pub struct PollTimers {
    pub agents: Interval,
    pub crew_status: Interval,
    pub crew_stats: Interval,
}

impl PollTimers {
    /// Create timers whose first tick fires immediately.
    pub fn new(agents: Duration, crew_status: Duration, crew_stats: Duration) -> Self {
        Self {
            agents: poll_interval(agents),
            crew_status: poll_interval(crew_status),
            crew_stats: poll_interval(crew_stats),
        }
    }

    /// Push the next scheduled tick of `endpoint` a full period away.
    pub fn reset(&mut self, endpoint: Endpoint) {
        match endpoint {
            Endpoint::Agents => self.agents.reset(),
            Endpoint::CrewStatus => self.crew_status.reset(),
            Endpoint::CrewStats => self.crew_stats.reset(),
        }
    }
}

fn poll_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
