use std::error;
use std::fmt;

use async_trait::async_trait;
use model::jog::JogRecord;

#[derive(Debug, Clone)]
pub enum RecordError {
    Rejected(String),
    Unavailable(String),
}

impl error::Error for RecordError {}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordError::Rejected(why) => write!(f, "Jog record rejected: {}", why),
            RecordError::Unavailable(why) => write!(f, "Jog store unavailable: {}", why),
        }
    }
}

/// Receives the record of every finished jog.
#[async_trait]
pub trait JogRecorder: Send + Sync {
    async fn record(&self, record: JogRecord) -> Result<(), RecordError>;
}
