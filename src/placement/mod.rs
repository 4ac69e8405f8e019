//! Pointer-to-anchor interaction: coordinate mapping, text box resolution, hit-testing and the
//! click/drag placement state machine.

pub mod anchor;
pub mod controller;
pub mod hit;
pub mod mapper;

pub use anchor::resolve_box;
pub use controller::{PlacementController, PlacementEvent, PlacementMode, PlacementOutcome};
pub use hit::is_inside;
pub use mapper::to_image_space;
