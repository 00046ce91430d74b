use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no document is open")]
    NothingOpen,

    #[error("cannot build a file URL for {0}")]
    Url(String),

    #[error("viewer error: {0}")]
    Viewer(String),
}
