//! Visual completion estimate for the progress bar.
//!
//! The job service does not report a real completion fraction, so this is a
//! heuristic: every `running` frame advances the bar by a fixed step, capped
//! below 100 so the bar only fills once the job has actually completed.

use crate::JobStatus;

/// Points added per `running` frame.
pub const RUNNING_STEP: u8 = 15;
/// Highest value reachable without a `completed` frame.
pub const RUNNING_CAP: u8 = 90;
/// Shown immediately on submission, before the first frame arrives.
pub const SUBMIT_FLOOR: u8 = 10;
pub const COMPLETE: u8 = 100;

/// Pure transition of the progress percentage for one observed status.
///
/// Never decreases the current value; only an explicit reset does that.
pub fn update(current: u8, status: &JobStatus) -> u8 {
    let current = current.min(COMPLETE);
    match status {
        JobStatus::Running { .. } => {
            let stepped = current.saturating_add(RUNNING_STEP).min(RUNNING_CAP);
            current.max(stepped)
        }
        JobStatus::Completed { .. } => COMPLETE,
        JobStatus::Idle | JobStatus::Error { .. } | JobStatus::Heartbeat | JobStatus::Unknown(_) => {
            current
        }
    }
}

