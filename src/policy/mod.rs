//! Model points and point selection

mod data;
pub mod loader;

pub use data::{ModelPoint, PointSelection, Sex};
pub use loader::{load_model_points, load_model_points_from_reader};
