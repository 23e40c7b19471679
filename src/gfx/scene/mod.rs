//! Scene management: object collection, per-object state, vertex format

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::SceneObject;
pub use scene::Scene;
pub use vertex::Vertex;
