use std::collections::HashMap;

use serde::Deserialize;

pub type RelationId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationType {
    Source,
    Sink,
    MaterializedView,
    Table,
    SystemTable,
}

impl RelationType {
    pub const ALL: [RelationType; 5] = [
        Self::Source,
        Self::Sink,
        Self::MaterializedView,
        Self::Table,
        Self::SystemTable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Sink => "sink",
            Self::MaterializedView => "materialized view",
            Self::Table => "table",
            Self::SystemTable => "system table",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Self::Source => "SRC",
            Self::Sink => "SNK",
            Self::MaterializedView => "MV",
            Self::Table => "TBL",
            Self::SystemTable => "SYS",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: String,
    #[serde(default, rename = "isPrimaryKey")]
    pub is_primary_key: bool,
}

#[derive(Clone, Debug)]
pub struct RelationNode {
    pub id: RelationId,
    pub name: String,
    pub relation_type: RelationType,
    pub columns: Vec<ColumnSchema>,
    pub dependencies: Vec<RelationId>,
    pub dependents: Vec<RelationId>,
}

#[derive(Clone, Debug)]
pub struct LineageGraph {
    pub database: Option<String>,
    pub relations: Vec<RelationNode>,
    pub index_by_id: HashMap<RelationId, usize>,
    pub edges: Vec<(RelationId, RelationId)>,
    pub warnings: Vec<String>,
}

impl LineageGraph {
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn relation(&self, id: RelationId) -> Option<&RelationNode> {
        self.index_by_id
            .get(&id)
            .and_then(|&index| self.relations.get(index))
    }
}
