//! Concrete state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[start requested ∧ check_all ok]──▶ ACTIVE
//!   ▲                                            │
//!   └──[stop │ complete │ ceiling │ critical]────┘
//! ```
//!
//! Rejected starts stay in IDLE and leave a `StartRejected` notice.

use super::context::{SessionContext, SessionNotice, StopReason};
use super::{StateDescriptor, StateId};
use crate::mode::{AlternatePhase, ChannelDuties, TreatmentMode};
use crate::safety;
use log::{debug, error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Active
        StateDescriptor {
            id: StateId::Active,
            name: "Active",
            on_enter: Some(active_enter),
            on_exit: Some(active_exit),
            on_update: active_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SessionContext) {
    ctx.duties = ChannelDuties::OFF;
    info!("IDLE: channels off");
}

fn idle_update(ctx: &mut SessionContext) -> Option<StateId> {
    // Nothing to stop.
    ctx.stop_request = None;

    if !core::mem::take(&mut ctx.start_requested) {
        return None;
    }

    let verdict = safety::check_all(
        ctx.readings.voltage,
        ctx.readings.temperature,
        ctx.counters.daily_session_count,
        ctx.counters.seconds_since_last(ctx.now_ms),
        false,
        0,
    );
    if let Some(err) = verdict.error {
        warn!("IDLE: start rejected: {}", err);
        ctx.notify(SessionNotice::StartRejected(err));
        return None;
    }

    Some(StateId::Active)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACTIVE state
// ═══════════════════════════════════════════════════════════════════════════

fn active_enter(ctx: &mut SessionContext) {
    ctx.session_start_ms = ctx.now_ms;
    ctx.counters.lifetime_sessions = ctx.counters.lifetime_sessions.saturating_add(1);
    ctx.counters.daily_session_count = ctx.counters.daily_session_count.saturating_add(1);
    ctx.phase = AlternatePhase::Red;
    ctx.last_flip_ms = ctx.now_ms;
    ctx.stop_request = None;
    ctx.apply_output();

    info!(
        "ACTIVE: {} ({}) for {} min, session #{} today",
        ctx.mode.name(),
        ctx.mode.description(),
        ctx.config.session_minutes,
        ctx.counters.daily_session_count
    );
    ctx.notify(SessionNotice::Started { mode: ctx.mode });
}

fn active_update(ctx: &mut SessionContext) -> Option<StateId> {
    // Guard: critical verdict → emergency stop
    if let Some(err) = ctx.safety.critical_error() {
        error!("ACTIVE: critical fault: {}", err);
        ctx.stop_request = Some(StopReason::Emergency(err));
        return Some(StateId::Idle);
    }

    if ctx.stop_request.is_some() {
        return Some(StateId::Idle);
    }

    // The ceiling is checked first so it can never be shadowed by completion.
    let elapsed = ctx.elapsed_secs();
    if safety::check_session_duration(elapsed).is_err() {
        warn!("ACTIVE: {}s reached the safety ceiling", elapsed);
        ctx.stop_request = Some(StopReason::SafetyCeiling);
        return Some(StateId::Idle);
    }
    if elapsed >= ctx.config.session_secs() {
        ctx.stop_request = Some(StopReason::Completed);
        return Some(StateId::Idle);
    }

    advance_phase(ctx);
    ctx.apply_output();
    None
}

fn active_exit(ctx: &mut SessionContext) {
    let reason = ctx.stop_request.take().unwrap_or(StopReason::User);
    let elapsed_secs = ctx.elapsed_secs();
    let minutes = (elapsed_secs / 60) as u32;

    ctx.counters.lifetime_minutes = ctx.counters.lifetime_minutes.saturating_add(minutes);
    ctx.counters.last_session_end_ms = Some(ctx.now_ms);
    ctx.start_requested = false;
    ctx.duties = ChannelDuties::OFF;

    info!(
        "ACTIVE: stopped ({:?}) after {}:{:02}, lifetime {} min",
        reason,
        elapsed_secs / 60,
        elapsed_secs % 60,
        ctx.counters.lifetime_minutes
    );
    ctx.notify(SessionNotice::Stopped { reason, elapsed_secs, minutes });
}

/// Flip the alternating phase once per elapsed period. The stored flip
/// time advances in whole periods, so tick jitter never accumulates.
fn advance_phase(ctx: &mut SessionContext) {
    if ctx.mode != TreatmentMode::Alternating {
        return;
    }
    let period_ms = u64::from(ctx.config.alternate_period_secs) * 1_000;
    if period_ms == 0 {
        return;
    }
    let flips = ctx.now_ms.saturating_sub(ctx.last_flip_ms) / period_ms;
    if flips == 0 {
        return;
    }
    ctx.last_flip_ms += flips * period_ms;
    if flips % 2 == 1 {
        ctx.phase = ctx.phase.flipped();
        debug!("ACTIVE: alternate phase -> {:?}", ctx.phase);
    }
}
