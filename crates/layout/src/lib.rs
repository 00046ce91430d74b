//! Spatial layout for newly ingested documents.
//!
//! Every new book gets a random spot on the ground plane, a random yaw and a
//! random palette color. There is no collision avoidance: overlapping books
//! are an accepted artifact. The random source is a type parameter so tests
//! can seed it.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use cosmos_core::config::LayoutConfig;
use cosmos_core::Placement;

#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("layout palette is empty")]
    EmptyPalette,

    #[error("invalid ground bound {0}: must be >= 0 with a finite span")]
    InvalidBound(f32),

    #[error("invalid max yaw {0}: must be >= 0 with a finite span")]
    InvalidYaw(f32),

    #[error("invalid baseline {0}: must be finite")]
    InvalidBaseline(f32),
}

/// A half-width usable for a symmetric range: non-negative, and `2 * limit`
/// must not overflow or sampling panics.
fn spannable(limit: f32) -> bool {
    limit >= 0.0 && (2.0 * limit).is_finite()
}

/// Check a config before it is used for placement.
pub fn validate(config: &LayoutConfig) -> Result<(), LayoutError> {
    if config.palette.is_empty() {
        return Err(LayoutError::EmptyPalette);
    }
    if !spannable(config.ground_bound) {
        return Err(LayoutError::InvalidBound(config.ground_bound));
    }
    if !spannable(config.max_yaw) {
        return Err(LayoutError::InvalidYaw(config.max_yaw));
    }
    if !config.baseline_y.is_finite() {
        return Err(LayoutError::InvalidBaseline(config.baseline_y));
    }
    Ok(())
}

pub struct LayoutModel<R: Rng = StdRng> {
    config: LayoutConfig,
    rng: R,
}

impl LayoutModel<StdRng> {
    /// Entropy-seeded model; placements differ on every run.
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible model for tests and demos.
    pub fn seeded(config: LayoutConfig, seed: u64) -> Result<Self, LayoutError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LayoutModel<R> {
    pub fn with_rng(config: LayoutConfig, rng: R) -> Result<Self, LayoutError> {
        validate(&config)?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Pick position, orientation and color for a new record.
    ///
    /// `existing_count` is the working set size before this record; it is
    /// only logged.
    pub fn assign(&mut self, existing_count: usize) -> Placement {
        let bound = self.config.ground_bound;
        let yaw_limit = self.config.max_yaw;

        let x = self.uniform(bound);
        let z = self.uniform(bound);
        let yaw = self.uniform(yaw_limit);
        let color = self
            .config
            .palette
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(cosmos_core::Color::white);

        let placement = Placement {
            position: [x, self.config.baseline_y, z],
            orientation: [0.0, yaw, 0.0],
            color,
        };
        debug!(
            existing_count,
            x,
            z,
            yaw,
            color = %placement.color,
            "placement assigned"
        );
        placement
    }

    fn uniform(&mut self, limit: f32) -> f32 {
        if limit == 0.0 {
            0.0
        } else {
            self.rng.gen_range(-limit..=limit)
        }
    }
}
