use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::graph::{ColumnSchema, RelationId, RelationType};

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawRelation {
    pub(super) id: RelationId,
    pub(super) name: String,
    #[serde(rename = "type")]
    pub(super) relation_type: RelationType,
    #[serde(default)]
    pub(super) columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub(super) dependencies: Vec<RelationId>,
}

pub(super) fn parse_relation_snapshot(raw: &str) -> Result<Vec<RawRelation>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid relation snapshot JSON")?;

    let entries = match &parsed {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(object) => object
            .get("relations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("relation snapshot object has no \"relations\" array"))?,
        _ => return Err(anyhow!("unexpected relation snapshot JSON shape")),
    };

    let mut relations = Vec::with_capacity(entries.len());
    for (index, value) in entries.iter().enumerate() {
        let relation = RawRelation::deserialize(value)
            .with_context(|| format!("invalid relation entry at index {index}"))?;
        relations.push(relation);
    }

    Ok(relations)
}
