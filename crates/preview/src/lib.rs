//! Detail view for a selected record and the transient file handles that
//! let a native viewer display its payload.

pub mod error;
pub mod handle;
pub mod view;

pub use error::PreviewError;
pub use handle::{HandleRegistry, PayloadHandle};
pub use view::{ExternalViewer, PreviewHeader, PreviewView};
