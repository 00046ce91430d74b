use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};

use cosmos_core::{Config, RecordId};
use cosmos_library::{
    DeleteOutcome, DirectoryAccess, FailedFile, IncomingFile, IngestReport, Library, Notice,
};
use cosmos_preview::{HandleRegistry, PreviewView};
use cosmos_scene::{compose, SceneRenderer, Stage};
use cosmos_storage::{RecordStore, SerializedStore};

use crate::cli::Command;
use crate::host::{directory_files, PathDirectory, SystemOpener};
use crate::terminal::Terminal;

pub struct App {
    pub config: Config,
    pub library: Library<SerializedStore>,
    pub terminal: Terminal,
}

pub async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Import { files } => import(app, &files).await,
        Command::List => list(app),
        Command::Show { id, open } => show(app, &id, open),
        Command::Download { id, to } => download(app, &id, &to),
        Command::Delete { id, yes } => delete(app, &id, yes).await,
        Command::Scene { select, hover, at } => scene(app, select.as_deref(), &hover, at),
        Command::Pick {
            ndc_x,
            ndc_y,
            aspect,
            at,
        } => pick(app, ndc_x, ndc_y, aspect, at),
        Command::Sync { dir } => sync(app, dir).await,
        Command::Status => status(app).await,
    }
}

/// Resolve a full id or a unique prefix of one against the working set.
/// A well-formed full id is returned even if no record has it.
fn resolve_id<S: RecordStore>(library: &Library<S>, raw: &str) -> Result<RecordId> {
    if let Ok(id) = RecordId::from_str(raw) {
        return Ok(id);
    }
    let needle = raw.trim().to_lowercase();
    if needle.is_empty() {
        bail!("empty document id");
    }
    let mut matches = library
        .documents()
        .iter()
        .map(|d| d.id())
        .filter(|id| id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (Some(_), Some(_)) => bail!("'{raw}' matches more than one document"),
        (None, _) => bail!("no document matches '{raw}'"),
    }
}

async fn read_files(paths: &[PathBuf]) -> (Vec<IncomingFile>, Vec<FailedFile>) {
    let mut files = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        match IncomingFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                unreadable.push(FailedFile {
                    name: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
    (files, unreadable)
}

fn print_report(terminal: &Terminal, report: &IngestReport) -> Result<()> {
    terminal.print_info(&format!(
        "Imported {}, skipped {} (not PDF), failed {}",
        report.accepted.len(),
        report.skipped.len(),
        report.failed.len()
    ))?;
    for failed in &report.failed {
        terminal.print_error(&format!("{}: {}", failed.name, failed.message))?;
    }
    Ok(())
}

async fn ingest_paths(app: &mut App, paths: &[PathBuf]) -> IngestReport {
    let (files, unreadable) = read_files(paths).await;
    app.library.drag_enter();
    let mut report = app.library.drop_files(files).await;
    report.failed.extend(unreadable);
    report
}

async fn import(app: &mut App, paths: &[PathBuf]) -> Result<()> {
    let report = ingest_paths(app, paths).await;
    print_report(&app.terminal, &report)?;
    for id in &report.accepted {
        if let Some(record) = app.library.get(*id) {
            app.terminal.print_selected(*id, record.name())?;
        }
    }
    app.terminal.print_info(&app.library.status_line())
}

fn list(app: &mut App) -> Result<()> {
    let entries = app.library.library_entries();
    app.terminal.print_entries(&entries, app.library.documents())?;
    app.terminal.print_info(&app.library.status_line())
}

fn show(app: &mut App, raw_id: &str, open: bool) -> Result<()> {
    let id = resolve_id(&app.library, raw_id)?;
    app.library.select(id);
    let record = app
        .library
        .selected_document()
        .ok_or_else(|| anyhow!("document {id} not found"))?;

    let registry = HandleRegistry::new().context("failed to create preview directory")?;
    let view = PreviewView::open(&registry, record).context("failed to prepare preview")?;
    let (Some(header), Some(handle)) = (view.header(), view.handle()) else {
        bail!("preview is empty");
    };
    app.terminal.print_details(&header, record, handle.url())?;

    if open {
        match SystemOpener::locate() {
            Some(opener) => {
                view.open_externally(&opener)
                    .context("failed to open the system viewer")?;
                // The payload file lives only as long as the view.
                app.terminal.prompt_yes_no("Viewer launched. Close the preview?")?;
            }
            None => app.terminal.print_notice(&Notice::CapabilityUnsupported {
                capability: "opening documents in a viewer".to_string(),
            })?,
        }
    }
    Ok(())
}

fn download(app: &mut App, raw_id: &str, dest: &Path) -> Result<()> {
    let id = resolve_id(&app.library, raw_id)?;
    let record = app
        .library
        .get(id)
        .ok_or_else(|| anyhow!("document {id} not found"))?;
    let registry = HandleRegistry::new().context("failed to create preview directory")?;
    let view = PreviewView::open(&registry, record).context("failed to prepare preview")?;
    let saved = view
        .download(dest)
        .with_context(|| format!("failed to save into {}", dest.display()))?;
    app.terminal.print_info(&format!("Saved {}", saved.display()))
}

async fn delete(app: &mut App, raw_id: &str, yes: bool) -> Result<()> {
    let id = resolve_id(&app.library, raw_id)?;
    let outcome = if yes {
        app.library.delete(id, &|_: &str| true).await
    } else {
        app.library.delete(id, &app.terminal).await
    };
    match outcome {
        DeleteOutcome::Deleted => {
            app.terminal.print_info(&format!("Removed {id}"))?;
            app.terminal.print_info(&app.library.status_line())
        }
        DeleteOutcome::Declined => app.terminal.print_info("Kept."),
        DeleteOutcome::NotFound => {
            info!(id = %id, "nothing to delete");
            Ok(())
        }
        // Reported as a notice.
        DeleteOutcome::Failed => Ok(()),
    }
}

fn parse_ids<S: RecordStore>(library: &Library<S>, raw: &[String]) -> Result<HashSet<RecordId>> {
    raw.iter().map(|r| resolve_id(library, r)).collect()
}

fn scene(app: &mut App, select: Option<&str>, hover: &[String], at: f32) -> Result<()> {
    let selected = select.map(|s| resolve_id(&app.library, s)).transpose()?;
    let hovered = parse_ids(&app.library, hover)?;
    let scene = compose(&Stage::default(), app.library.documents(), selected, &hovered, at);
    println!("{}", serde_json::to_string_pretty(&scene)?);
    Ok(())
}

fn pick(app: &mut App, ndc_x: f32, ndc_y: f32, aspect: f32, at: f32) -> Result<()> {
    if !(aspect.is_finite() && aspect > 0.0) {
        bail!("aspect must be a positive number");
    }
    let renderer = SceneRenderer::default();
    match renderer.click(app.library.documents(), ndc_x, ndc_y, aspect, at) {
        Some(id) => {
            app.library.select(id);
            let name = app
                .library
                .selected_document()
                .map(|d| d.name().to_string())
                .unwrap_or_default();
            app.terminal.print_selected(id, &name)
        }
        None => app.terminal.print_info("Nothing there."),
    }
}

async fn sync(app: &mut App, dir: Option<PathBuf>) -> Result<()> {
    let picker = dir.map(PathDirectory::new);
    let notice = app
        .library
        .request_directory_access(picker.as_ref().map(|p| p as &dyn DirectoryAccess));

    if let (Notice::DirectoryConnected { .. }, Some(picker)) = (&notice, &picker) {
        let paths = directory_files(picker.path())
            .with_context(|| format!("failed to list {}", picker.path().display()))?;
        let report = ingest_paths(app, &paths).await;
        print_report(&app.terminal, &report)?;
    }
    Ok(())
}

async fn status(app: &mut App) -> Result<()> {
    let stats = cosmos_storage::stats(app.library.store())
        .await
        .context("failed to read store statistics")?;
    let report = serde_json::json!({
        "config": app.config.summary(),
        "store": stats,
        "documents": app.library.documents().len(),
        "onboarding": app.library.onboarding_visible(),
        "status": app.library.status_line(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
