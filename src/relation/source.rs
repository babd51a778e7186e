use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use super::graph::{LineageGraph, RelationId, RelationNode};
use super::parse::{RawRelation, parse_relation_snapshot};

#[derive(Clone, Debug)]
pub enum RelationSource {
    Snapshot(PathBuf),
    Console {
        base_url: String,
        database: Option<String>,
    },
}

impl RelationSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Snapshot(path) => path.display().to_string(),
            Self::Console { base_url, database } => match database {
                Some(database) => format!("{base_url} ({database})"),
                None => base_url.clone(),
            },
        }
    }

    pub fn load(&self) -> Result<LineageGraph> {
        let raw = self.fetch_raw()?;
        let relations = parse_relation_snapshot(&raw)?;
        let database = match self {
            Self::Console { database, .. } => database.clone(),
            Self::Snapshot(_) => None,
        };

        let graph = build_lineage_graph(relations, database)?;
        for warning in &graph.warnings {
            warn!("{warning}");
        }
        info!(
            relations = graph.relation_count(),
            edges = graph.edge_count(),
            warnings = graph.warnings.len(),
            "loaded lineage snapshot"
        );
        Ok(graph)
    }

    fn fetch_raw(&self) -> Result<String> {
        match self {
            Self::Snapshot(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read relation snapshot {}", path.display())),
            Self::Console { base_url, database } => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()
                    .context("failed to build HTTP client")?;

                let url = format!("{}/api/v1/relations", base_url.trim_end_matches('/'));
                let mut request = client.get(&url);
                if let Some(database) = database {
                    request = request.query(&[("database", database.as_str())]);
                }

                request
                    .send()
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.text())
                    .with_context(|| format!("failed to fetch relations from {url}"))
            }
        }
    }
}

pub(super) fn build_lineage_graph(
    raw: Vec<RawRelation>,
    database: Option<String>,
) -> Result<LineageGraph> {
    let mut index_by_id = HashMap::with_capacity(raw.len());
    for (index, relation) in raw.iter().enumerate() {
        if let Some(previous) = index_by_id.insert(relation.id, index) {
            return Err(anyhow!(
                "duplicate relation id {}: \"{}\" and \"{}\"",
                relation.id,
                raw[previous].name,
                relation.name
            ));
        }
    }

    let mut warnings = Vec::new();
    let mut relations = Vec::with_capacity(raw.len());

    for entry in raw {
        let mut dependencies = Vec::with_capacity(entry.dependencies.len());
        for &dependency in &entry.dependencies {
            if dependency == entry.id {
                warnings.push(format!(
                    "relation {} (\"{}\") depends on itself; edge dropped",
                    entry.id, entry.name
                ));
                continue;
            }
            if !index_by_id.contains_key(&dependency) {
                warnings.push(format!(
                    "relation {} (\"{}\") depends on unknown relation {}; edge dropped",
                    entry.id, entry.name, dependency
                ));
                continue;
            }
            dependencies.push(dependency);
        }
        dependencies.sort_unstable();
        dependencies.dedup();

        relations.push(RelationNode {
            id: entry.id,
            name: entry.name,
            relation_type: entry.relation_type,
            columns: entry.columns,
            dependencies,
            dependents: Vec::new(),
        });
    }

    let mut dependents: HashMap<RelationId, Vec<RelationId>> = HashMap::new();
    let mut edges = Vec::new();
    for relation in &relations {
        for &dependency in &relation.dependencies {
            edges.push((dependency, relation.id));
            dependents.entry(dependency).or_default().push(relation.id);
        }
    }
    edges.sort_unstable();
    edges.dedup();

    for relation in &mut relations {
        if let Some(mut entries) = dependents.remove(&relation.id) {
            entries.sort_unstable();
            entries.dedup();
            relation.dependents = entries;
        }
    }

    Ok(LineageGraph {
        database,
        relations,
        index_by_id,
        edges,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::graph::RelationType;

    fn raw(id: RelationId, name: &str, dependencies: &[RelationId]) -> RawRelation {
        RawRelation {
            id,
            name: name.to_string(),
            relation_type: RelationType::Table,
            columns: Vec::new(),
            dependencies: dependencies.to_vec(),
        }
    }

    #[test]
    fn duplicate_relation_ids_fail() {
        let result = build_lineage_graph(vec![raw(1, "a", &[]), raw(1, "b", &[])], None);
        assert!(result.is_err());
    }

    #[test]
    fn dangling_dependency_is_dropped_with_a_warning() {
        let graph = build_lineage_graph(vec![raw(1, "a", &[99])], None).unwrap();
        assert!(graph.relations[0].dependencies.is_empty());
        assert!(graph.edges.is_empty());
        assert_eq!(graph.warnings.len(), 1);
        assert!(graph.warnings[0].contains("unknown relation 99"));
    }

    #[test]
    fn self_dependency_is_dropped_with_a_warning() {
        let graph = build_lineage_graph(vec![raw(3, "loop", &[3])], None).unwrap();
        assert!(graph.relations[0].dependencies.is_empty());
        assert_eq!(graph.warnings.len(), 1);
        assert!(graph.warnings[0].contains("depends on itself"));
    }

    #[test]
    fn edges_point_from_dependency_to_dependent() {
        let graph =
            build_lineage_graph(vec![raw(1, "source", &[]), raw(2, "sink", &[1])], None).unwrap();
        assert_eq!(graph.edges, vec![(1, 2)]);
    }

    #[test]
    fn dependents_mirror_dependencies() {
        let graph = build_lineage_graph(
            vec![raw(1, "base", &[]), raw(2, "mv1", &[1]), raw(3, "mv2", &[1, 2])],
            None,
        )
        .unwrap();

        assert_eq!(graph.relation(1).unwrap().dependents, vec![2, 3]);
        assert_eq!(graph.relation(2).unwrap().dependents, vec![3]);
        assert!(graph.relation(3).unwrap().dependents.is_empty());
    }

    #[test]
    fn duplicate_dependencies_are_deduplicated() {
        let graph =
            build_lineage_graph(vec![raw(1, "a", &[]), raw(2, "b", &[1, 1, 1])], None).unwrap();
        assert_eq!(graph.relation(2).unwrap().dependencies, vec![1]);
        assert_eq!(graph.edges, vec![(1, 2)]);
    }
}
