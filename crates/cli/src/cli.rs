use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PDF Cosmos: a spatial library for your PDF documents.
///
/// Every imported PDF becomes a book floating in a 3D scene. The library is
/// kept on disk between runs.
#[derive(Parser, Debug)]
#[command(name = "cosmos", version, about = "A spatial library for PDF documents")]
pub struct CliArgs {
    /// Data directory (overrides DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory for this run only
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import PDF files; anything else is skipped
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the library
    List,

    /// Show one document's details
    Show {
        id: String,

        /// Open the document in the system viewer
        #[arg(long)]
        open: bool,
    },

    /// Save a copy of a document
    Download {
        id: String,

        /// Destination directory (default: current directory)
        #[arg(long, default_value = ".")]
        to: PathBuf,
    },

    /// Remove a document from the library
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Print the scene as JSON
    Scene {
        /// Record to render as selected
        #[arg(long)]
        select: Option<String>,

        /// Records to render as hovered
        #[arg(long)]
        hover: Vec<String>,

        /// Animation time in seconds
        #[arg(long, default_value = "0")]
        at: f32,
    },

    /// Find the book under a pointer position (normalized device coordinates)
    Pick {
        #[arg(allow_hyphen_values = true)]
        ndc_x: f32,

        #[arg(allow_hyphen_values = true)]
        ndc_y: f32,

        /// Viewport width / height
        #[arg(long, default_value = "1.7777778")]
        aspect: f32,

        /// Animation time in seconds
        #[arg(long, default_value = "0")]
        at: f32,
    },

    /// Connect a local directory and import the PDFs in it
    Sync {
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show configuration and store statistics
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from(["cosmos", "list", "--memory"]).unwrap();
        assert!(args.memory);
        assert!(matches!(args.command, Command::List));
    }

    #[test]
    fn pick_accepts_negative_coordinates() {
        let args = CliArgs::try_parse_from(["cosmos", "pick", "-0.5", "0.25", "--aspect", "1"]).unwrap();
        match args.command {
            Command::Pick { ndc_x, ndc_y, aspect, at } => {
                assert_eq!((ndc_x, ndc_y, aspect, at), (-0.5, 0.25, 1.0, 0.0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn import_needs_files() {
        assert!(CliArgs::try_parse_from(["cosmos", "import"]).is_err());
    }
}
