#[derive(Debug, thiserror::Error)]
pub enum EccError {
    #[error("Malformed counter value: {raw:?}")]
    MalformedCounter { raw: String },

    #[error("Negative counter value: {0}")]
    NegativeCounter(i64),

    #[error("Unknown reporting mode: {0}")]
    UnknownReportingMode(String),
}
