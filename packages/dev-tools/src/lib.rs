//! SceneLink Development Tools
//!
//! Support code for the `dev-mcp` binary: an in-memory demo scene wired to
//! the core command surface.

pub mod scene;

pub use scene::{build_registry, Scene, SceneObject};
