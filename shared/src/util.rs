//! Shared utility functions

/// Current wall-clock time as epoch milliseconds.
///
/// All persisted timestamps in this workspace are i64 epoch millis.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
