//! The invocation graph of a transformed design.
//!
//! Nodes are members; an edge `caller -> target` weighs the largest number
//! of concurrent instances of `target` the caller requested. The graph
//! answers how many instances of each member the design needs and which
//! members are recursive.

use crate::member::TransformedMember;
use hast_common::Ident;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::BTreeMap;

/// Who invokes whom, and with how many instances.
#[derive(Clone, Debug, Default)]
pub struct InvocationGraph {
    graph: DiGraph<Ident, u32>,
    nodes: BTreeMap<Ident, NodeIndex>,
}

impl InvocationGraph {
    /// Builds the graph from the instance counts each member recorded.
    pub fn build(members: &[TransformedMember]) -> Self {
        let mut graph = Self::default();
        for member in members {
            graph.node(member.name);
        }
        for member in members {
            let caller = graph.node(member.name);
            let counts = member
                .machine
                .component()
                .other_member_max_invocation_instance_counts();
            for (&target, &count) in counts {
                let target = graph.node(target);
                graph.graph.add_edge(caller, target, count);
            }
        }
        graph
    }

    fn node(&mut self, member: Ident) -> NodeIndex {
        if let Some(&index) = self.nodes.get(&member) {
            return index;
        }
        let index = self.graph.add_node(member);
        self.nodes.insert(member, index);
        index
    }

    /// Number of members in the graph, including invoked ones that were not
    /// transformed.
    pub fn member_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of caller-target pairs.
    pub fn invocation_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Callers of `target`, each with the instances it requested.
    pub fn callers_of(&self, target: Ident) -> Vec<(Ident, u32)> {
        let Some(&node) = self.nodes.get(&target) else {
            return Vec::new();
        };
        let mut callers: Vec<(Ident, u32)> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (self.graph[edge.source()], *edge.weight()))
            .collect();
        callers.sort();
        callers
    }

    /// Members `caller` invokes, each with the instances it requested.
    pub fn targets_of(&self, caller: Ident) -> Vec<(Ident, u32)> {
        let Some(&node) = self.nodes.get(&caller) else {
            return Vec::new();
        };
        let mut targets: Vec<(Ident, u32)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect();
        targets.sort();
        targets
    }

    /// Instances of `target` the whole design needs: one pool per caller.
    pub fn required_instance_count(&self, target: Ident) -> u32 {
        self.callers_of(target).iter().map(|(_, count)| count).sum()
    }

    /// Members that can invoke themselves, directly or through others; sorted.
    pub fn recursive_members(&self) -> Vec<Ident> {
        let mut recursive = Vec::new();
        for component in tarjan_scc(&self.graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| self.graph.contains_edge(n, n));
            if cyclic {
                recursive.extend(component.iter().map(|&n| self.graph[n]));
            }
        }
        recursive.sort();
        recursive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::MemberStateMachine;

    fn member(name: u32, invokes: &[(u32, u32)]) -> TransformedMember {
        let mut machine = MemberStateMachine::new(Ident::from_raw(name)).unwrap();
        for &(target, count) in invokes {
            machine
                .component_mut()
                .record_invocation_instance_count(Ident::from_raw(target), count);
        }
        TransformedMember {
            name: Ident::from_raw(name),
            machine,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn instance_counts_sum_over_callers() {
        let graph = InvocationGraph::build(&[
            member(0, &[(2, 4)]),
            member(1, &[(2, 1)]),
            member(2, &[]),
        ]);
        assert_eq!(graph.member_count(), 3);
        assert_eq!(graph.invocation_count(), 2);
        assert_eq!(graph.required_instance_count(Ident::from_raw(2)), 5);
        assert_eq!(
            graph.callers_of(Ident::from_raw(2)),
            vec![(Ident::from_raw(0), 4), (Ident::from_raw(1), 1)]
        );
        assert_eq!(graph.required_instance_count(Ident::from_raw(0)), 0);
    }

    #[test]
    fn untransformed_targets_still_get_nodes() {
        let graph = InvocationGraph::build(&[member(0, &[(7, 2)])]);
        assert_eq!(graph.member_count(), 2);
        assert_eq!(graph.targets_of(Ident::from_raw(0)), vec![(Ident::from_raw(7), 2)]);
    }

    #[test]
    fn recursion_is_detected() {
        let graph = InvocationGraph::build(&[
            member(0, &[(0, 1)]),
            member(1, &[(2, 1)]),
            member(2, &[(1, 1)]),
            member(3, &[(1, 1)]),
        ]);
        assert_eq!(
            graph.recursive_members(),
            vec![Ident::from_raw(0), Ident::from_raw(1), Ident::from_raw(2)]
        );
    }

    #[test]
    fn acyclic_graph_has_no_recursion() {
        let graph = InvocationGraph::build(&[member(0, &[(1, 1)]), member(1, &[])]);
        assert!(graph.recursive_members().is_empty());
    }
}
