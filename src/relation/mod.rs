mod graph;
mod parse;
mod source;

pub use graph::{ColumnSchema, LineageGraph, RelationId, RelationNode, RelationType};
pub use source::RelationSource;
