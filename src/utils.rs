use chrono::Utc;
use uuid::Uuid;

/// Server-generated record ids are plain v4 uuid strings.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Epoch milliseconds, the timestamp format records are stored with.
pub fn epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
