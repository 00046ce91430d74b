use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use tracing::debug;

use cosmos_core::{DocumentRecord, RecordId};
use cosmos_library::{Confirm, LibraryEntry, Notice};
use cosmos_preview::PreviewHeader;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const PROMPT: Color = Color::Green;
    const NOTICE: Color = Color::Yellow;
    const ALERT: Color = Color::Red;
    const SELECTED: Color = Color::Green;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Exact 24-bit terminal color for a `#rrggbb` record color.
fn swatch(rgb: [u8; 3]) -> Color {
    Color::Rgb {
        r: rgb[0],
        g: rgb[1],
        b: rgb[2],
    }
}

/// Terminal output for the `cosmos` commands.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the library listing, one colored row per record.
    pub fn print_entries(&self, entries: &[LibraryEntry], records: &[DocumentRecord]) -> Result<()> {
        let mut stdout = io::stdout();
        if entries.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("Your cosmos is empty. Import some PDFs to get started.\n"),
                ResetColor,
            )?;
            return Ok(());
        }

        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Library:\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("{:<38} {:<40} {:>10}\n", "ID", "NAME", "SIZE")),
            Print(format!("{}\n", "-".repeat(90))),
            ResetColor,
        )?;

        for (entry, record) in entries.iter().zip(records) {
            execute!(
                stdout,
                SetForegroundColor(swatch(entry.color.rgb())),
                Print("■ "),
                ResetColor,
                Print(format!(
                    "{:<36} {:<40} {:>10}\n",
                    entry.id,
                    truncate(&entry.name, 40),
                    record.size_label(),
                )),
            )?;
        }

        stdout.flush()?;
        Ok(())
    }

    /// Print the detail header and metadata of one record.
    pub fn print_details(&self, header: &PreviewHeader, record: &DocumentRecord, url: &str) -> Result<()> {
        let mut stdout = io::stdout();
        let modified = record
            .last_modified_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let [x, y, z] = record.position();

        execute!(
            stdout,
            SetForegroundColor(swatch(header.color.rgb())),
            Print("■ "),
            SetForegroundColor(Colors::HEADER),
            Print(format!("{}\n", header.name)),
            ResetColor,
            SetForegroundColor(Colors::DIM),
            Print(format!("  id        {}\n", record.id())),
            Print(format!("  size      {}\n", header.size_label)),
            Print(format!("  modified  {}\n", modified)),
            Print(format!("  color     {}\n", header.color)),
            Print(format!("  position  [{x:.2}, {y:.2}, {z:.2}]\n")),
            Print(format!("  url       {}\n", url)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_notice(&self, notice: &Notice) -> Result<()> {
        let mut stdout = io::stdout();
        let color = if notice.is_alert() {
            Colors::ALERT
        } else {
            Colors::NOTICE
        };
        execute!(
            stdout,
            SetForegroundColor(color),
            Print(format!("{}\n", notice)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_selected(&self, id: RecordId, name: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::SELECTED),
            Print(format!("{id}")),
            ResetColor,
            Print(format!("  {name}\n")),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Ask a yes/no question. An empty answer means no.
    pub fn prompt_yes_no(&self, question: &str) -> Result<bool> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::PROMPT),
            Print(format!("{question} [y/N] ")),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(is_yes(&input))
    }

    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ALERT),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

impl Confirm for Terminal {
    fn confirm(&self, prompt: &str) -> bool {
        match self.prompt_yes_no(prompt) {
            Ok(answer) => answer,
            Err(e) => {
                debug!(error = %e, "confirmation prompt failed, treating as no");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn swatch_keeps_exact_channels() {
        assert_eq!(swatch([0xe7, 0x4c, 0x3c]), Color::Rgb { r: 0xe7, g: 0x4c, b: 0x3c });
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }
}
