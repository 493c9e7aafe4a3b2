pub mod model;
pub mod graph;
pub mod concepts;
pub mod join_path;
pub mod plan;
pub mod registry;
pub mod loader;

pub use model::*;
pub use graph::*;
pub use concepts::*;
pub use join_path::*;
pub use plan::*;
pub use registry::*;
pub use loader::*;
