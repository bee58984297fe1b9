//! Canonical group traversal order.
//!
//! With usable edges the order is a breadth-first walk from the start node, where the
//! children of each node are visited left to right by canvas position. Groups the walk
//! never reaches are appended by position. Without usable edges every group is simply
//! sorted by position.

use std::{
    cmp::Ordering,
    collections::{HashMap, VecDeque},
};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};
use tracing::trace;

use crate::flow::{Flow, Group, GroupId, START_NODE_ID};

/// A group in canonical order, tagged `G1..Gn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedGroup {
    pub tag: String,
    pub id: GroupId,
}

/// Position order: x, then y, then id so that stacked groups stay deterministic.
pub fn by_position(
    a: &Group,
    b: &Group,
) -> Ordering {
    a.position.x.total_cmp(&b.position.x).then(a.position.y.total_cmp(&b.position.y)).then_with(|| a.id.cmp(&b.id))
}

/// Resolve the canonical order of `flow`'s groups. Total: never fails.
pub fn resolve_order(flow: &Flow) -> Vec<OrderedGroup> {
    resolve_group_ids(flow)
        .into_iter()
        .enumerate()
        .map(|(i, id)| OrderedGroup {
            tag: format!("G{}", i + 1),
            id,
        })
        .collect()
}

fn resolve_group_ids(flow: &Flow) -> Vec<GroupId> {
    let groups = flow.groups();

    let mut graph: DiGraph<Option<&Group>, ()> = DiGraph::new();
    let start = graph.add_node(None);
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    index.insert(START_NODE_ID, start);
    for group in groups {
        index.insert(group.id.as_str(), graph.add_node(Some(group)));
    }

    for edge in flow.edges() {
        if let (Some(source), Some(target)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
            graph.add_edge(*source, *target, ());
        }
    }

    if graph.edge_count() == 0 {
        trace!("no usable edges, ordering {} groups by position", groups.len());
        let mut sorted: Vec<&Group> = groups.iter().collect();
        sorted.sort_by(|a, b| by_position(a, b));
        return sorted.into_iter().map(|g| g.id.clone()).collect();
    }

    let mut visited = vec![false; graph.node_count()];
    let mut queue = VecDeque::from([start]);
    visited[start.index()] = true;
    let mut order = Vec::with_capacity(groups.len());

    while let Some(current) = queue.pop_front() {
        if let Some(group) = graph[current] {
            order.push(group.id.clone());
        }

        let mut next: Vec<NodeIndex> = graph.neighbors_directed(current, Direction::Outgoing).filter(|n| !visited[n.index()]).collect();
        next.sort_by(|a, b| match (graph[*a], graph[*b]) {
            (Some(ga), Some(gb)) => by_position(ga, gb),
            _ => a.index().cmp(&b.index()),
        });

        for n in next {
            if !visited[n.index()] {
                visited[n.index()] = true;
                queue.push_back(n);
            }
        }
    }

    let mut islands: Vec<&Group> = graph.node_indices().filter(|n| !visited[n.index()]).filter_map(|n| graph[n]).collect();
    if !islands.is_empty() {
        trace!("{} groups unreachable from start", islands.len());
    }
    islands.sort_by(|a, b| by_position(a, b));
    order.extend(islands.into_iter().map(|g| g.id.clone()));

    order
}
