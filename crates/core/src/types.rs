/// Raw EDAC counters are exposed as non-negative decimal integers; kept
/// signed so sums and differences never wrap.
pub type CounterValue = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
