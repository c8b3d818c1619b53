// src/resolve/mod.rs
// =============================================================================
// Dependency resolution.
//
// Submodules:
// - metadata: asks the JSON metadata API what one package requires
// - resolver: breadth-first closure over those answers
// =============================================================================

mod metadata;
mod resolver;

pub use metadata::MetadataClient;
pub use resolver::DependencyResolver;
