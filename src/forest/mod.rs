//! Parent and child links between node indices.
//!
//! Every node has an ordered collection of child nodes and at most one parent.
//! When a node has not been attached to any other node it is implicitly
//! considered to be a root. Links are plain indices, so a parent link never
//! keeps anything alive.
mod linked;

pub use linked::{Ancestors, AttachError, Children, LinkedForest};
