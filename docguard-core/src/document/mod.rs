pub mod builder;
pub mod serialization;
pub mod tree;

pub use tree::{DocumentNode, DocumentTree, ElementData, NodeKind, StyleMap};
