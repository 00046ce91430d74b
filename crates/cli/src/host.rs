//! Host collaborators for the command line: the system document opener and a
//! directory "picker" backed by a path argument.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use cosmos_library::{DirectoryAccess, DirectoryAccessError, DirectoryGrant};
use cosmos_preview::{ExternalViewer, PreviewError};

#[cfg(target_os = "macos")]
const OPENERS: &[&str] = &["open"];
#[cfg(target_os = "windows")]
const OPENERS: &[&str] = &["explorer"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENERS: &[&str] = &["xdg-open"];

/// Opens URLs with the platform's default handler.
pub struct SystemOpener {
    program: PathBuf,
}

impl SystemOpener {
    /// Locate an opener on `PATH`, or `None` if the platform has none.
    pub fn locate() -> Option<Self> {
        OPENERS.iter().find_map(|name| match which::which(name) {
            Ok(program) => {
                debug!(program = %program.display(), "found system opener");
                Some(Self { program })
            }
            Err(_) => None,
        })
    }
}

impl ExternalViewer for SystemOpener {
    fn open(&self, url: &str) -> Result<(), PreviewError> {
        info!(program = %self.program.display(), url, "launching viewer");
        let status = Command::new(&self.program)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PreviewError::Viewer(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )))
        }
    }
}

/// Grants access to a directory named on the command line.
pub struct PathDirectory {
    dir: PathBuf,
}

impl PathDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl DirectoryAccess for PathDirectory {
    fn request(&self) -> Result<DirectoryGrant, DirectoryAccessError> {
        let meta = std::fs::metadata(&self.dir)
            .map_err(|e| DirectoryAccessError::Denied(format!("{}: {e}", self.dir.display())))?;
        if !meta.is_dir() {
            return Err(DirectoryAccessError::Denied(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        let name = self
            .dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| self.dir.display().to_string());
        Ok(DirectoryGrant { name })
    }
}

/// Regular files directly inside `dir`, sorted by name.
pub fn directory_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn grants_existing_directory_by_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Papers");
        std::fs::create_dir(&dir).unwrap();

        let grant = PathDirectory::new(&dir).request().unwrap();
        assert_eq!(grant.name, "Papers");
    }

    #[test]
    fn denies_missing_or_plain_file() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            PathDirectory::new(tmp.path().join("missing")).request(),
            Err(DirectoryAccessError::Denied(_))
        ));

        let file = tmp.path().join("a.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        assert!(matches!(
            PathDirectory::new(&file).request(),
            Err(DirectoryAccessError::Denied(_))
        ));
    }

    #[test]
    fn lists_only_files_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.pdf"), b"").unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        let names: Vec<_> = directory_files(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.txt", "b.pdf"]);
    }
}
