use crate::cri;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Cri(#[from] cri::Error),
    #[error(transparent)]
    Config(#[from] cri::ConfigError),
    #[error("failed to serialize stats report: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("system clock is before the unix epoch: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

pub type Result<T> = std::result::Result<T, Error>;
