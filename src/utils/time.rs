use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the precision Postgres keeps, so
/// in-memory snapshots compare equal to what the store hands back.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
