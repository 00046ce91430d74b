use thiserror::Error;

#[derive(Error, Debug)]
pub enum CosmosError {
    #[error("invalid record id '{0}'")]
    InvalidId(String),

    #[error("invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
