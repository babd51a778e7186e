use std::collections::{HashSet, VecDeque};

use eframe::egui::{Vec2, vec2};

pub const NODE_WIDTH: f32 = 250.0;
pub const NODE_HEIGHT: f32 = 100.0;

const LAYER_GAP: f32 = 130.0;
const NODE_GAP: f32 = 40.0;
const ORDERING_SWEEPS: usize = 3;

pub fn layered_layout(node_count: usize, edges: &[(usize, usize)]) -> Vec<Vec2> {
    let n = node_count;
    if n == 0 {
        return Vec::new();
    }

    let mut outgoing = vec![Vec::new(); n];
    for &(from, to) in edges {
        if from >= n || to >= n || from == to {
            continue;
        }
        outgoing[from].push(to);
    }

    // Edges that close a cycle are back-edges; they are kept out of rank
    // assignment so depth stays well-defined.
    let mut visit_state = vec![0u8; n];
    let mut back_edges = HashSet::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for root in 0..n {
        if visit_state[root] != 0 {
            continue;
        }
        visit_state[root] = 1;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            if cursor < outgoing[node].len() {
                frame.1 += 1;
                let next = outgoing[node][cursor];
                match visit_state[next] {
                    0 => {
                        visit_state[next] = 1;
                        stack.push((next, 0));
                    }
                    1 => {
                        back_edges.insert((node, next));
                    }
                    _ => {}
                }
            } else {
                visit_state[node] = 2;
                stack.pop();
            }
        }
    }

    let mut forward = vec![Vec::new(); n];
    let mut predecessors = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for (from, targets) in outgoing.iter().enumerate() {
        for &to in targets {
            if back_edges.contains(&(from, to)) {
                continue;
            }
            forward[from].push(to);
            predecessors[to].push(from);
            indegree[to] += 1;
        }
    }

    let mut rank = vec![0usize; n];
    let mut ready = (0..n)
        .filter(|&node| indegree[node] == 0)
        .collect::<VecDeque<_>>();
    while let Some(node) = ready.pop_front() {
        for &next in &forward[node] {
            rank[next] = rank[next].max(rank[node] + 1);
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.push_back(next);
            }
        }
    }

    let layer_count = rank.iter().copied().max().unwrap_or(0) + 1;
    let mut layers = vec![Vec::new(); layer_count];
    for node in 0..n {
        layers[rank[node]].push(node);
    }

    let mut slot = vec![0usize; n];
    for layer in &layers {
        for (position, &node) in layer.iter().enumerate() {
            slot[node] = position;
        }
    }

    fn reorder(layer: &mut Vec<usize>, neighbors: &[Vec<usize>], slot: &mut [usize]) {
        let mut keyed = layer
            .iter()
            .map(|&node| {
                let adjacent = &neighbors[node];
                let barycenter = if adjacent.is_empty() {
                    slot[node] as f32
                } else {
                    adjacent.iter().map(|&other| slot[other] as f32).sum::<f32>()
                        / adjacent.len() as f32
                };
                (barycenter, node)
            })
            .collect::<Vec<_>>();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        layer.clear();
        for (position, &(_, node)) in keyed.iter().enumerate() {
            layer.push(node);
            slot[node] = position;
        }
    }

    for _ in 0..ORDERING_SWEEPS {
        for layer in layers.iter_mut() {
            reorder(layer, &predecessors, &mut slot);
        }
        for layer in layers.iter_mut().rev() {
            reorder(layer, &forward, &mut slot);
        }
    }

    let mut positions = vec![Vec2::ZERO; n];
    for (depth, layer) in layers.iter().enumerate() {
        let column_x = depth as f32 * (NODE_WIDTH + LAYER_GAP);
        let span = layer.len() as f32 * NODE_HEIGHT
            + layer.len().saturating_sub(1) as f32 * NODE_GAP;
        let first_center = (NODE_HEIGHT - span) * 0.5;

        for (position, &node) in layer.iter().enumerate() {
            let center_y = first_center + position as f32 * (NODE_HEIGHT + NODE_GAP);
            positions[node] = vec2(column_x - NODE_WIDTH * 0.5, center_y - NODE_HEIGHT * 0.5);
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_position_per_node() {
        let edges = vec![(0, 1), (0, 2), (1, 3), (2, 3)];
        assert_eq!(layered_layout(4, &edges).len(), 4);
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert!(layered_layout(0, &[]).is_empty());
    }

    #[test]
    fn cycles_terminate_and_still_rank_left_to_right() {
        let edges = vec![(0, 1), (1, 2), (2, 0)];
        let positions = layered_layout(3, &edges);
        assert_eq!(positions.len(), 3);
        assert!(positions[0].x < positions[1].x);
        assert!(positions[1].x < positions[2].x);
    }

    #[test]
    fn self_edges_do_not_loop() {
        let positions = layered_layout(2, &[(0, 0), (0, 1)]);
        assert_eq!(positions.len(), 2);
        assert!(positions[0].x < positions[1].x);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let edges = vec![(0, 2), (1, 2), (2, 3), (3, 4), (1, 4)];
        assert_eq!(layered_layout(5, &edges), layered_layout(5, &edges));
    }

    #[test]
    fn same_layer_boxes_never_overlap() {
        let edges = vec![(0, 1), (0, 2), (0, 3)];
        let positions = layered_layout(4, &edges);

        assert_eq!(positions[1].x, positions[2].x);
        assert_eq!(positions[2].x, positions[3].x);

        let mut ys = vec![positions[1].y, positions[2].y, positions[3].y];
        ys.sort_by(f32::total_cmp);
        assert!(ys[1] - ys[0] >= NODE_HEIGHT);
        assert!(ys[2] - ys[1] >= NODE_HEIGHT);
    }

    #[test]
    fn isolated_nodes_share_the_first_layer() {
        let positions = layered_layout(4, &[(0, 1)]);
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0].x, positions[2].x);
        assert_eq!(positions[2].x, positions[3].x);
        assert!(positions[1].x > positions[0].x);
    }

    #[test]
    fn ranks_increase_along_forward_chains() {
        let edges = vec![(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)];
        let positions = layered_layout(5, &edges);
        assert!(positions[0].x < positions[1].x);
        assert!(positions[1].x < positions[3].x);
        assert!(positions[3].x < positions[4].x);
    }
}
