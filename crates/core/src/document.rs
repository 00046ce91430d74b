use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;
use crate::error::CosmosError;

/// The only MIME type accepted for ingestion.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Names longer than this are shortened on labels.
pub const LABEL_MAX_CHARS: usize = 20;
const LABEL_KEEP_CHARS: usize = 17;

/// Three spatial components: `[x, y, z]`.
pub type Vec3 = [f32; 3];

/// Opaque record identifier, also the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = CosmosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CosmosError::InvalidId(s.to_string()))
    }
}

/// Spatial attributes and color assigned once, at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    pub orientation: Vec3,
    pub color: Color,
}

/// One imported document: metadata, payload and its place in the scene.
///
/// Records are immutable once built. There are no setters; the only
/// lifecycle operations are creation and deletion from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    id: RecordId,
    name: String,
    size_bytes: u64,
    last_modified: i64,
    payload: Bytes,
    placement: Placement,
}

impl DocumentRecord {
    /// Build a fresh record with a newly generated id.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        last_modified: i64,
        payload: Bytes,
        placement: Placement,
    ) -> Self {
        Self::restore(RecordId::new(), name, size_bytes, last_modified, payload, placement)
    }

    /// Rebuild a record with a known id (used when decoding stored entries).
    pub fn restore(
        id: RecordId,
        name: impl Into<String>,
        size_bytes: u64,
        last_modified: i64,
        payload: Bytes,
        placement: Placement,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            size_bytes,
            last_modified,
            payload,
            placement,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Source file modification time, epoch milliseconds.
    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_modified).single()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn color(&self) -> &Color {
        &self.placement.color
    }

    pub fn position(&self) -> Vec3 {
        self.placement.position
    }

    pub fn orientation(&self) -> Vec3 {
        self.placement.orientation
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Name as shown on the book label: long names are cut to 17 chars + `...`.
    pub fn display_label(&self) -> String {
        if self.name.chars().count() > LABEL_MAX_CHARS {
            let head: String = self.name.chars().take(LABEL_KEEP_CHARS).collect();
            format!("{head}...")
        } else {
            self.name.clone()
        }
    }

    /// Size in megabytes with two decimals, e.g. `1.50 MB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }

    /// Filename offered for save-as: the final path component of the name.
    pub fn suggested_filename(&self) -> String {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.pdf", self.id))
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            last_modified: self.last_modified,
            color: self.placement.color.clone(),
            position: self.placement.position,
            orientation: self.placement.orientation,
        }
    }
}

/// Record metadata without the payload, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub name: String,
    pub size_bytes: u64,
    pub last_modified: i64,
    pub color: Color,
    pub position: Vec3,
    pub orientation: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> Placement {
        Placement {
            position: [1.0, 0.0, -2.0],
            orientation: [0.0, 0.3, 0.0],
            color: Color::parse("#2ecc71").unwrap(),
        }
    }

    fn record(name: &str, size: u64) -> DocumentRecord {
        DocumentRecord::new(name, size, 1_700_000_000_000, Bytes::from_static(b"%PDF-1.7"), placement())
    }

    #[test]
    fn ids_are_unique_and_parse_back() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<RecordId>().unwrap(), a);
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }

    #[test]
    fn short_labels_are_untouched() {
        assert_eq!(record("report.pdf", 10).display_label(), "report.pdf");
        let exact = "a".repeat(LABEL_MAX_CHARS);
        assert_eq!(record(&exact, 10).display_label(), exact);
    }

    #[test]
    fn long_labels_are_truncated() {
        let rec = record("quarterly-financial-report-2024.pdf", 10);
        assert_eq!(rec.display_label(), "quarterly-financi...");
        assert_eq!(rec.display_label().chars().count(), 20);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let rec = record("ééééééééééééééééééééééé.pdf", 10);
        assert_eq!(rec.display_label(), format!("{}...", "é".repeat(17)));
    }

    #[test]
    fn size_label_in_megabytes() {
        assert_eq!(record("a.pdf", 1_572_864).size_label(), "1.50 MB");
        assert_eq!(record("a.pdf", 0).size_label(), "0.00 MB");
    }

    #[test]
    fn suggested_filename_strips_directories() {
        assert_eq!(record("docs/nested/a.pdf", 1).suggested_filename(), "a.pdf");
        let rec = record("", 1);
        assert_eq!(rec.suggested_filename(), format!("{}.pdf", rec.id()));
    }

    #[test]
    fn last_modified_converts_to_datetime() {
        let at = record("a.pdf", 1).last_modified_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn summary_omits_payload_but_keeps_layout() {
        let rec = record("a.pdf", 42);
        let summary = rec.summary();
        assert_eq!(summary.id, rec.id());
        assert_eq!(summary.position, rec.position());
        assert_eq!(summary.color, *rec.color());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("payload").is_none());
        assert_eq!(json["size_bytes"], 42);
    }
}
