//! Scene composition for PDF Cosmos: camera, lights, one book per record,
//! idle animation and pointer hit-testing.

pub mod camera;
pub mod math;
pub mod renderer;
pub mod scene;

pub use camera::{Camera, Ray};
pub use renderer::SceneRenderer;
pub use scene::{
    compose, phase, BookNode, ContactShadows, Label, Light, Material, OrbitControls, Ring, Scene,
    Stage, Starfield, BOOK_SIZE, SELECTED_RING_COLOR,
};
