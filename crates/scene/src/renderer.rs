use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use cosmos_core::{DocumentRecord, RecordId};

use crate::scene::{compose, Scene, Stage};

/// Stateful front of [`compose`]: owns the clock and the hover set.
///
/// Hover is transient renderer state; it never reaches the library.
#[derive(Debug)]
pub struct SceneRenderer {
    stage: Stage,
    started: Instant,
    hovered: HashSet<RecordId>,
}

impl SceneRenderer {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            started: Instant::now(),
            hovered: HashSet::new(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    pub fn pointer_over(&mut self, id: RecordId) {
        self.hovered.insert(id);
    }

    pub fn pointer_out(&mut self, id: RecordId) {
        self.hovered.remove(&id);
    }

    pub fn is_hovered(&self, id: RecordId) -> bool {
        self.hovered.contains(&id)
    }

    /// Forget hover state for records that left the working set.
    pub fn retain_hover(&mut self, documents: &[DocumentRecord]) {
        self.hovered
            .retain(|id| documents.iter().any(|d| d.id() == *id));
    }

    /// Scene at the current clock.
    pub fn frame(&self, documents: &[DocumentRecord], selected_id: Option<RecordId>) -> Scene {
        self.frame_at(documents, selected_id, self.elapsed_secs())
    }

    /// Scene at a fixed time, for snapshots and tests.
    pub fn frame_at(
        &self,
        documents: &[DocumentRecord],
        selected_id: Option<RecordId>,
        elapsed_secs: f32,
    ) -> Scene {
        compose(&self.stage, documents, selected_id, &self.hovered, elapsed_secs)
    }

    /// Resolve a click at normalized device coordinates to the book under it.
    /// The host forwards a hit to `Library::select`.
    pub fn click(
        &self,
        documents: &[DocumentRecord],
        ndc_x: f32,
        ndc_y: f32,
        aspect: f32,
        elapsed_secs: f32,
    ) -> Option<RecordId> {
        let scene = self.frame_at(documents, None, elapsed_secs);
        let ray = self.stage.camera.ray_through(ndc_x, ndc_y, aspect);
        let hit = scene.pick(&ray);
        debug!(ndc_x, ndc_y, hit = ?hit, "pick");
        hit
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(Stage::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cosmos_core::{Color, Placement};

    fn record(position: [f32; 3]) -> DocumentRecord {
        DocumentRecord::new(
            "book.pdf",
            10,
            0,
            Bytes::from_static(b"%PDF"),
            Placement {
                position,
                orientation: [0.0; 3],
                color: Color::parse("#9b59b6").unwrap(),
            },
        )
    }

    #[test]
    fn hover_tracks_pointer() {
        let mut renderer = SceneRenderer::default();
        let doc = record([0.0; 3]);
        renderer.pointer_over(doc.id());
        assert!(renderer.is_hovered(doc.id()));
        assert!(renderer.frame_at(std::slice::from_ref(&doc), None, 0.0).books[0]
            .ring
            .is_some());

        renderer.pointer_out(doc.id());
        assert!(!renderer.is_hovered(doc.id()));

        renderer.pointer_over(doc.id());
        renderer.retain_hover(&[]);
        assert!(!renderer.is_hovered(doc.id()));
    }

    #[test]
    fn click_on_projected_center_selects_book() {
        let renderer = SceneRenderer::default();
        let docs = vec![record([-2.0, 0.0, 1.0]), record([2.5, 0.0, -1.0])];
        let aspect = 16.0 / 9.0;
        let t = 3.0;

        let scene = renderer.frame_at(&docs, None, t);
        for node in &scene.books {
            let ndc = renderer
                .stage()
                .camera
                .project(scene.world_center(node), aspect)
                .unwrap();
            assert_eq!(renderer.click(&docs, ndc[0], ndc[1], aspect, t), Some(node.id));
        }
    }

    #[test]
    fn click_on_sky_hits_nothing() {
        let renderer = SceneRenderer::default();
        let docs = vec![record([0.0; 3])];
        assert_eq!(renderer.click(&docs, 0.0, 0.95, 1.0, 0.0), None);
    }
}
