//! Declarative scene description built from the working set.
//!
//! `compose` is pure: the same records, selection, hover set and time always
//! produce the same scene. Idle animation lives only on [`BookNode`]
//! transforms; records are read, never written.

use std::collections::HashSet;
use std::f32::consts::{PI, TAU};

use serde::Serialize;

use cosmos_core::{Color, DocumentRecord, RecordId, Vec3};

use crate::camera::{Camera, Ray};
use crate::math::{add, rotate_y, sub};

/// Book box extents: width, height, spine depth.
pub const BOOK_SIZE: Vec3 = [1.5, 2.0, 0.3];
pub const SELECTED_RING_COLOR: &str = "#4ade80";

const BOB_AMPLITUDE: f32 = 0.1;
const SWAY_AMPLITUDE: f32 = 0.05;
const SWAY_RATE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    Ambient {
        intensity: f32,
    },
    Point {
        position: Vec3,
        intensity: f32,
        cast_shadow: bool,
    },
    Spot {
        position: Vec3,
        angle: f32,
        penumbra: f32,
        intensity: f32,
        cast_shadow: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Starfield {
    pub radius: f32,
    pub depth: f32,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactShadows {
    pub opacity: f32,
    pub scale: f32,
    pub blur: f32,
    pub far: f32,
}

/// Orbit limits on the polar angle, radians from straight up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitControls {
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

/// Everything in the scene that does not depend on the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub stars: Starfield,
    pub contact_shadows: ContactShadows,
    pub controls: OrbitControls,
    pub environment: String,
    /// Offset applied to the group holding every book.
    pub group_offset: Vec3,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            lights: vec![
                Light::Ambient { intensity: 0.4 },
                Light::Point {
                    position: [10.0, 10.0, 10.0],
                    intensity: 1.5,
                    cast_shadow: true,
                },
                Light::Spot {
                    position: [-10.0, 15.0, 10.0],
                    angle: 0.3,
                    penumbra: 1.0,
                    intensity: 2.0,
                    cast_shadow: true,
                },
            ],
            stars: Starfield {
                radius: 100.0,
                depth: 50.0,
                count: 5000,
            },
            contact_shadows: ContactShadows {
                opacity: 0.4,
                scale: 20.0,
                blur: 2.4,
                far: 4.5,
            },
            controls: OrbitControls {
                min_polar_angle: 0.0,
                max_polar_angle: PI / 1.8,
            },
            environment: "city".to_string(),
            group_offset: [0.0, -2.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Option<Color>,
    pub emissive_intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub position: Vec3,
    pub font_size: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
    pub y: f32,
    pub opacity: f32,
    pub color: Color,
}

/// The rendered form of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookNode {
    pub id: RecordId,
    /// Animated position, relative to the book group.
    pub position: Vec3,
    /// Animated Euler rotation; only the Y component varies.
    pub rotation: Vec3,
    pub size: Vec3,
    pub material: Material,
    pub label: Label,
    pub ring: Option<Ring>,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub elapsed_secs: f32,
    #[serde(flatten)]
    pub stage: Stage,
    pub books: Vec<BookNode>,
}

/// Per-record animation offset in `[0, 2π)`, stable for a given id.
pub fn phase(id: RecordId) -> f32 {
    let bytes = id.as_uuid().as_bytes();
    // 24 bits fit an f32 mantissa exactly.
    let seed = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
    (seed as f32 / (1u32 << 24) as f32 * TAU) % TAU
}

/// Build the scene for one frame.
pub fn compose(
    stage: &Stage,
    documents: &[DocumentRecord],
    selected_id: Option<RecordId>,
    hovered: &HashSet<RecordId>,
    elapsed_secs: f32,
) -> Scene {
    let books = documents
        .iter()
        .map(|record| {
            let selected = selected_id == Some(record.id());
            book_node(record, selected, hovered.contains(&record.id()), elapsed_secs)
        })
        .collect();

    Scene {
        elapsed_secs,
        stage: stage.clone(),
        books,
    }
}

fn book_node(record: &DocumentRecord, selected: bool, hovered: bool, t: f32) -> BookNode {
    let [x, y, z] = record.position();
    let [rx, ry, rz] = record.orientation();
    let bob = (t + phase(record.id())).sin() * BOB_AMPLITUDE;
    let sway = (t * SWAY_RATE).cos() * SWAY_AMPLITUDE;
    let color = record.color().clone();

    let ring = (selected || hovered).then(|| Ring {
        inner_radius: 0.8,
        outer_radius: 0.9,
        segments: 32,
        y: -1.1,
        opacity: 0.5,
        color: if selected {
            Color::parse(SELECTED_RING_COLOR).unwrap_or_else(|_| Color::white())
        } else {
            Color::white()
        },
    });

    BookNode {
        id: record.id(),
        position: [x, y + bob, z],
        rotation: [rx, ry + sway, rz],
        size: BOOK_SIZE,
        material: Material {
            color: color.clone(),
            metalness: 0.2,
            roughness: 0.5,
            emissive: selected.then(|| color.clone()),
            emissive_intensity: if selected { 0.5 } else { 0.0 },
        },
        label: Label {
            text: record.display_label(),
            position: [0.0, 1.2, 0.0],
            font_size: 0.15,
            color: Color::white(),
        },
        ring,
        selected,
        hovered,
    }
}

impl Scene {
    /// World-space center of a book, including the group offset.
    pub fn world_center(&self, node: &BookNode) -> Vec3 {
        add(self.stage.group_offset, node.position)
    }

    pub fn book(&self, id: RecordId) -> Option<&BookNode> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Nearest book hit by `ray`, tested against each book's box at its
    /// animated transform.
    pub fn pick(&self, ray: &Ray) -> Option<RecordId> {
        self.books
            .iter()
            .filter_map(|node| {
                let center = self.world_center(node);
                let yaw = node.rotation[1];
                let origin = rotate_y(sub(ray.origin, center), -yaw);
                let direction = rotate_y(ray.direction, -yaw);
                let half = [node.size[0] / 2.0, node.size[1] / 2.0, node.size[2] / 2.0];
                slab_hit(origin, direction, half).map(|t| (t, node.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }
}

/// Entry distance of a ray into an origin-centered axis-aligned box.
fn slab_hit(origin: Vec3, direction: Vec3, half: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let (o, d, h) = (origin[axis], direction[axis], half[axis]);
        if d.abs() < 1e-8 {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        None
    } else {
        Some(t_min.max(0.0))
    }
}
