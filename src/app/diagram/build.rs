use std::collections::HashMap;

use eframe::egui::Vec2;

use crate::layout::layered_layout;
use crate::metrics::ThroughputTable;
use crate::relation::{RelationNode, RelationType};
use crate::util::format_throughput;

use super::super::{DiagramEdge, DiagramGraph, DiagramNode, ViewModel};

impl ViewModel {
    /// Rebuilds the diagram from the current graph and filters.
    ///
    /// When the visible topology is unchanged (same nodes in the same order,
    /// same edges) the existing geometry is kept, so throughput refreshes and
    /// background reloads never disturb manual drags. Any topology difference
    /// discards the old geometry and runs a fresh layout.
    pub(in crate::app) fn rebuild_diagram(&mut self) {
        let show_system = self.show_system_tables;
        let visible: Vec<usize> = self
            .graph
            .relations
            .iter()
            .enumerate()
            .filter(|(_, relation)| {
                show_system || relation.relation_type != RelationType::SystemTable
            })
            .map(|(index, _)| index)
            .collect();

        let mut index_by_id = HashMap::with_capacity(visible.len());
        for (diagram_index, &graph_index) in visible.iter().enumerate() {
            index_by_id.insert(self.graph.relations[graph_index].id, diagram_index);
        }

        let mut edges = Vec::new();
        for &(source_id, target_id) in &self.graph.edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&source_id), index_by_id.get(&target_id))
            else {
                continue;
            };
            let streaming = self
                .graph
                .relation(target_id)
                .is_some_and(|relation| relation.relation_type == RelationType::MaterializedView);
            edges.push(DiagramEdge {
                source,
                target,
                streaming,
            });
        }
        edges.sort_unstable_by_key(|edge| (edge.source, edge.target));

        let prior = self.diagram.take();
        let topology_unchanged = prior.as_ref().is_some_and(|diagram| {
            diagram.nodes.len() == visible.len()
                && diagram
                    .nodes
                    .iter()
                    .zip(&visible)
                    .all(|(node, &graph_index)| node.id == self.graph.relations[graph_index].id)
                && diagram.edges.len() == edges.len()
                && diagram
                    .edges
                    .iter()
                    .zip(&edges)
                    .all(|(old, new)| (old.source, old.target) == (new.source, new.target))
        });

        let mut diagram = if let (true, Some(prior)) = (topology_unchanged, prior) {
            let mut nodes = prior.nodes;
            for node in &mut nodes {
                if let Some(relation) = self.graph.relation(node.id) {
                    node.name = relation.name.clone();
                    node.relation_type = relation.relation_type;
                    node.columns = relation.columns.clone();
                }
            }
            DiagramGraph {
                nodes,
                edges,
                index_by_id,
            }
        } else {
            let edge_pairs: Vec<(usize, usize)> =
                edges.iter().map(|edge| (edge.source, edge.target)).collect();
            let positions = layered_layout(visible.len(), &edge_pairs);
            let relations: Vec<&RelationNode> = visible
                .iter()
                .map(|&graph_index| &self.graph.relations[graph_index])
                .collect();
            DiagramGraph {
                nodes: assemble_nodes(&relations, &positions, &self.throughput),
                edges,
                index_by_id,
            }
        };

        apply_throughput(&mut diagram.nodes, &self.throughput);

        self.visible_node_count = diagram.nodes.len();
        self.visible_edge_count = diagram.edges.len();
        self.diagram = Some(diagram);
        self.diagram_dirty = false;
    }

    /// Refreshes throughput fields on the existing diagram without touching
    /// geometry. Used when a poll tick lands between rebuilds.
    pub(in crate::app) fn patch_diagram_throughput(&mut self) {
        if let Some(diagram) = &mut self.diagram {
            apply_throughput(&mut diagram.nodes, &self.throughput);
        }
    }
}

fn assemble_nodes(
    relations: &[&RelationNode],
    positions: &[Vec2],
    throughput: &ThroughputTable,
) -> Vec<DiagramNode> {
    relations
        .iter()
        .zip(positions)
        .map(|(relation, &pos)| {
            let value = throughput.get(relation.id);
            DiagramNode {
                id: relation.id,
                name: relation.name.clone(),
                relation_type: relation.relation_type,
                columns: relation.columns.clone(),
                pos,
                dragged: false,
                throughput: value,
                throughput_label: format_throughput(value),
            }
        })
        .collect()
}

fn apply_throughput(nodes: &mut [DiagramNode], throughput: &ThroughputTable) -> bool {
    let mut changed = false;
    for node in nodes {
        let value = throughput.get(node.id);
        if node.throughput != value {
            node.throughput = value;
            node.throughput_label = format_throughput(value);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use eframe::egui::vec2;

    use crate::metrics::PollEvent;
    use crate::relation::{ColumnSchema, LineageGraph, RelationId};

    use super::*;

    fn relation(
        id: RelationId,
        name: &str,
        relation_type: RelationType,
        dependencies: &[RelationId],
    ) -> RelationNode {
        RelationNode {
            id,
            name: name.to_owned(),
            relation_type,
            columns: vec![ColumnSchema {
                name: "id".to_owned(),
                data_type: "bigint".to_owned(),
                is_primary_key: true,
            }],
            dependencies: dependencies.to_vec(),
            dependents: Vec::new(),
        }
    }

    fn graph(relations: Vec<RelationNode>) -> LineageGraph {
        let index_by_id = relations
            .iter()
            .enumerate()
            .map(|(index, relation)| (relation.id, index))
            .collect();
        let mut edges: Vec<(RelationId, RelationId)> = relations
            .iter()
            .flat_map(|relation| {
                relation
                    .dependencies
                    .iter()
                    .map(|&dependency| (dependency, relation.id))
            })
            .collect();
        edges.sort_unstable();

        LineageGraph {
            database: None,
            relations,
            index_by_id,
            edges,
            warnings: Vec::new(),
        }
    }

    fn model(relations: Vec<RelationNode>) -> ViewModel {
        ViewModel::new(graph(relations), None, None, Duration::from_secs(5))
    }

    fn sample(seq: u64, entries: &[(RelationId, f64)]) -> PollEvent {
        PollEvent {
            seq,
            result: Ok(entries.iter().copied().collect()),
        }
    }

    #[test]
    fn assemble_without_samples_leaves_throughput_absent() {
        let relations = vec![relation(1, "orders", RelationType::Table, &[])];
        let refs: Vec<&RelationNode> = relations.iter().collect();

        let nodes = assemble_nodes(&refs, &[Vec2::ZERO], &ThroughputTable::default());

        assert_eq!(nodes[0].throughput, None);
        assert_eq!(nodes[0].throughput_label, "not available");
    }

    #[test]
    fn assemble_distinguishes_zero_from_absent() {
        let relations = vec![
            relation(1, "orders", RelationType::Table, &[]),
            relation(2, "payments", RelationType::Table, &[]),
        ];
        let refs: Vec<&RelationNode> = relations.iter().collect();
        let mut table = ThroughputTable::default();
        table.apply(sample(1, &[(1, 0.0)]));

        let nodes = assemble_nodes(&refs, &[Vec2::ZERO, Vec2::ZERO], &table);

        assert_eq!(nodes[0].throughput, Some(0.0));
        assert_eq!(nodes[0].throughput_label, "0.00 rows/sec");
        assert_eq!(nodes[1].throughput, None);
        assert_eq!(nodes[1].throughput_label, "not available");
    }

    #[test]
    fn assemble_is_value_equal_for_identical_inputs() {
        let relations = vec![
            relation(1, "orders", RelationType::Source, &[]),
            relation(2, "orders_mv", RelationType::MaterializedView, &[1]),
        ];
        let refs: Vec<&RelationNode> = relations.iter().collect();
        let positions = [vec2(0.0, 0.0), vec2(380.0, 0.0)];
        let mut table = ThroughputTable::default();
        table.apply(sample(1, &[(2, 12.5)]));

        let first = assemble_nodes(&refs, &positions, &table);
        let second = assemble_nodes(&refs, &positions, &table);

        assert_eq!(first, second);
    }

    #[test]
    fn apply_throughput_reformats_only_changed_nodes() {
        let relations = vec![
            relation(1, "orders", RelationType::Table, &[]),
            relation(2, "payments", RelationType::Table, &[]),
        ];
        let refs: Vec<&RelationNode> = relations.iter().collect();
        let mut nodes = assemble_nodes(&refs, &[Vec2::ZERO, Vec2::ZERO], &ThroughputTable::default());
        nodes[1].throughput_label = "sentinel".to_owned();

        let mut table = ThroughputTable::default();
        table.apply(sample(1, &[(1, 1500.0)]));
        let changed = apply_throughput(&mut nodes, &table);

        assert!(changed);
        assert_eq!(nodes[0].throughput_label, "1.50 K rows/sec");
        // Node 2 stayed absent, so its label is not rewritten.
        assert_eq!(nodes[1].throughput_label, "sentinel");

        assert!(!apply_throughput(&mut nodes, &table));
    }

    #[test]
    fn rebuild_assembles_filtered_topology() {
        let mut model = model(vec![
            relation(1, "kafka_orders", RelationType::Source, &[]),
            relation(2, "orders_mv", RelationType::MaterializedView, &[1]),
            relation(3, "rw_catalog", RelationType::SystemTable, &[]),
        ]);

        model.rebuild_diagram();
        let diagram = model.diagram.as_ref().unwrap();
        assert_eq!(diagram.nodes.len(), 3);
        assert_eq!(diagram.edges.len(), 1);
        assert!(diagram.edges[0].streaming);
        assert_eq!(model.visible_node_count, 3);

        model.show_system_tables = false;
        model.diagram_dirty = true;
        model.rebuild_diagram();
        let diagram = model.diagram.as_ref().unwrap();
        assert_eq!(diagram.nodes.len(), 2);
        assert!(!diagram.index_by_id.contains_key(&3));
        assert_eq!(model.visible_node_count, 2);
    }

    #[test]
    fn edges_into_plain_tables_are_not_streaming() {
        let mut model = model(vec![
            relation(1, "kafka_orders", RelationType::Source, &[]),
            relation(2, "orders", RelationType::Table, &[1]),
        ]);

        model.rebuild_diagram();

        let diagram = model.diagram.as_ref().unwrap();
        assert!(!diagram.edges[0].streaming);
    }

    #[test]
    fn dragged_positions_survive_throughput_only_rebuilds() {
        let mut model = model(vec![
            relation(1, "orders", RelationType::Table, &[]),
            relation(2, "orders_mv", RelationType::MaterializedView, &[1]),
        ]);
        model.rebuild_diagram();

        {
            let diagram = model.diagram.as_mut().unwrap();
            diagram.nodes[0].pos = vec2(777.0, -40.0);
            diagram.nodes[0].dragged = true;
        }

        model.throughput.apply(sample(1, &[(1, 9.0)]));
        model.diagram_dirty = true;
        model.rebuild_diagram();

        let diagram = model.diagram.as_ref().unwrap();
        assert_eq!(diagram.nodes[0].pos, vec2(777.0, -40.0));
        assert!(diagram.nodes[0].dragged);
        assert_eq!(diagram.nodes[0].throughput, Some(9.0));
    }

    #[test]
    fn topology_change_resets_layout_and_drag_state() {
        let mut model = model(vec![
            relation(1, "orders", RelationType::Table, &[]),
            relation(2, "orders_mv", RelationType::MaterializedView, &[1]),
            relation(3, "rw_catalog", RelationType::SystemTable, &[]),
        ]);
        model.rebuild_diagram();

        {
            let diagram = model.diagram.as_mut().unwrap();
            diagram.nodes[0].pos = vec2(500.0, 500.0);
            diagram.nodes[0].dragged = true;
        }

        model.show_system_tables = false;
        model.diagram_dirty = true;
        model.rebuild_diagram();

        let diagram = model.diagram.as_ref().unwrap();
        assert!(!diagram.nodes[0].dragged);
        assert_ne!(diagram.nodes[0].pos, vec2(500.0, 500.0));
    }

    #[test]
    fn patch_updates_labels_without_moving_nodes() {
        let mut model = model(vec![
            relation(1, "orders", RelationType::Table, &[]),
            relation(2, "orders_mv", RelationType::MaterializedView, &[1]),
        ]);
        model.rebuild_diagram();
        let before: Vec<Vec2> = model
            .diagram
            .as_ref()
            .unwrap()
            .nodes
            .iter()
            .map(|node| node.pos)
            .collect();

        model.throughput.apply(sample(1, &[(2, 2_000_000.0)]));
        model.patch_diagram_throughput();

        let diagram = model.diagram.as_ref().unwrap();
        let after: Vec<Vec2> = diagram.nodes.iter().map(|node| node.pos).collect();
        assert_eq!(before, after);
        assert_eq!(diagram.nodes[1].throughput_label, "2.00 M rows/sec");
    }
}
