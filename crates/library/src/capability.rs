//! Host collaborators the library asks for decisions or platform features.

use thiserror::Error;

/// Blocking yes/no question before a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A directory the user granted access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGrant {
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryAccessError {
    #[error("directory access is not supported on this platform")]
    Unsupported,

    #[error("{0}")]
    Denied(String),
}

/// Optional, best-effort directory picker.
pub trait DirectoryAccess {
    fn request(&self) -> Result<DirectoryGrant, DirectoryAccessError>;
}
