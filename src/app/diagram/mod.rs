mod build;
mod interaction;
mod node;
mod view;

pub(in crate::app) use node::relation_fill;
pub(in crate::app) use view::{DEPENDENCY_EDGE_COLOR, FLOW_DOT_COLOR, STREAMING_EDGE_COLOR};
