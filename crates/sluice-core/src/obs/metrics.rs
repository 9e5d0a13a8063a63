use serde::{Deserialize, Serialize};
use std::{
    sync::{Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Process-wide counters for shared-resource and transaction activity.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub since_ms: u64,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Shared slots
    pub cache_hits: u64,
    pub cache_inits: u64,
    pub ephemeral_fallbacks: u64,
    pub cached_releases: u64,
    pub ephemeral_releases: u64,

    // Transactions
    pub tx_begins: u64,
    pub tx_commits: u64,
    pub tx_rollbacks: u64,

    // Schema
    pub migration_steps: u64,
    pub tables_created: u64,
}

///
/// EventReport
/// Point-in-time copy of the global counters.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: Option<EventState>,
}

static STATE: Mutex<Option<EventState>> = Mutex::new(None);

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    let mut guard = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let state = guard.get_or_insert_with(|| EventState {
        ops: EventOps::default(),
        since_ms: now_millis(),
    });

    f(state)
}

pub(crate) fn report() -> EventReport {
    let guard = STATE.lock().unwrap_or_else(PoisonError::into_inner);

    EventReport {
        counters: guard.clone(),
    }
}

pub(crate) fn reset_all() {
    *STATE.lock().unwrap_or_else(PoisonError::into_inner) = None;
}
