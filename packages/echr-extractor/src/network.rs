//! Citation network construction.
//!
//! Cases become nodes; a case whose `scl` (Strasbourg case-law) field cites
//! the application number or ECLI of another case gets an edge to it.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use regex::Regex;

use crate::types::{EchrCase, NetworkEdge, NetworkNode};

/// Boilerplate removed from `scl` before application numbers are extracted.
#[allow(clippy::expect_used)] // Static regexes that are guaranteed to be valid
static SCL_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)EUR\. COURT H\.R\.", r"(?i)JUDGMENT OF.*", r"(?i) DU.*"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// Application number pattern, e.g. `6289/73`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static APP_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+/\d+").expect("valid regex"));

/// Extract the distinct case references in an `scl` value, in order of
/// first appearance.
///
/// # Examples
/// ```
/// use echr_extractor::network::parse_references;
///
/// let scl = "Airey v. Ireland, no. 6289/73; Golder, no. 4451/70; Airey, no. 6289/73";
/// assert_eq!(parse_references(scl), vec!["6289/73", "4451/70"]);
/// ```
pub fn parse_references(scl: &str) -> Vec<String> {
    if scl.is_empty() {
        return Vec::new();
    }

    let cleaned = SCL_NOISE
        .iter()
        .fold(scl.to_string(), |text, pattern| {
            pattern.replace_all(&text, "").into_owned()
        });

    let mut seen = HashSet::new();
    APP_NUMBER
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

/// Keep the first case per ECLI; cases without an ECLI are deduplicated by
/// item id instead.
pub fn dedupe_cases(cases: &[EchrCase]) -> Vec<&EchrCase> {
    let mut seen = HashSet::new();
    cases
        .iter()
        .filter(|case| {
            let key = if case.ecli.is_empty() {
                ("itemid", case.itemid.as_str())
            } else {
                ("ecli", case.ecli.as_str())
            };
            seen.insert(key)
        })
        .collect()
}

/// Directed citation graph over cases.
#[derive(Debug, Default)]
pub struct CitationGraph {
    graph: DiGraph<NetworkNode, NetworkEdge>,
    /// Item id to node index.
    index: HashMap<String, NodeIndex>,
}

impl CitationGraph {
    /// Build the graph from extracted cases.
    pub fn from_cases(cases: &[EchrCase]) -> Self {
        let unique = dedupe_cases(cases);
        let mut graph = Self::default();

        // Reference key (application number or ECLI) to the first case holding it
        let mut lookup: HashMap<&str, NodeIndex> = HashMap::new();

        for case in &unique {
            let idx = graph.add_node(NetworkNode::from(*case));
            for appno in case.application_numbers() {
                lookup.entry(appno).or_insert(idx);
            }
            if !case.ecli.is_empty() {
                lookup.entry(case.ecli.as_str()).or_insert(idx);
            }
        }

        for case in &unique {
            let Some(&source) = graph.index.get(&case.itemid) else {
                continue;
            };
            for reference in parse_references(&case.scl) {
                match lookup.get(reference.as_str()) {
                    Some(&target) if target != source => graph.add_citation(source, target),
                    _ => {}
                }
            }
        }

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Generated citation network"
        );
        graph
    }

    fn add_node(&mut self, node: NetworkNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    fn add_citation(&mut self, source: NodeIndex, target: NodeIndex) {
        if self.graph.find_edge(source, target).is_some() {
            return;
        }
        let edge = NetworkEdge::references(
            self.graph[source].id.clone(),
            self.graph[target].id.clone(),
        );
        self.graph.add_edge(source, target, edge);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> Vec<NetworkNode> {
        self.graph.node_weights().cloned().collect()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> Vec<NetworkEdge> {
        self.graph.edge_weights().cloned().collect()
    }

    /// Item ids of the cases cited by `item_id`.
    pub fn citations(&self, item_id: &str) -> Vec<&str> {
        self.neighbors(item_id, Direction::Outgoing)
    }

    /// Item ids of the cases citing `item_id`.
    pub fn cited_by(&self, item_id: &str) -> Vec<&str> {
        self.neighbors(item_id, Direction::Incoming)
    }

    fn neighbors(&self, item_id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(item_id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .edges_directed(idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.graph[other].id.as_str()
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Consume the graph into node and edge lists.
    pub fn into_parts(self) -> (Vec<NetworkNode>, Vec<NetworkEdge>) {
        let (nodes, edges) = self.graph.into_nodes_edges();
        (
            nodes.into_iter().map(|n| n.weight).collect(),
            edges.into_iter().map(|e| e.weight).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn case(itemid: &str, appno: &str, ecli: &str, scl: &str) -> EchrCase {
        EchrCase {
            itemid: itemid.to_string(),
            appno: appno.to_string(),
            ecli: ecli.to_string(),
            scl: scl.to_string(),
            ..EchrCase::default()
        }
    }

    #[test]
    fn test_parse_references_strips_noise() {
        let scl = "EUR. COURT H.R. 1234/56 judgment of 12/10/1990 and more 9/99";
        assert_eq!(parse_references(scl), vec!["1234/56"]);
    }

    #[test]
    fn test_parse_references_du_suffix() {
        let scl = "Arrêt 1111/11 du 22/03/2001";
        assert_eq!(parse_references(scl), vec!["1111/11"]);
    }

    #[test]
    fn test_parse_references_empty() {
        assert!(parse_references("").is_empty());
        assert!(parse_references("Golder v. the United Kingdom, Series A no. 18").is_empty());
    }

    #[test]
    fn test_dedupe_by_ecli_then_itemid() {
        let cases = vec![
            case("001-1", "", "ECLI:A", ""),
            case("001-2", "", "ECLI:A", ""),
            case("001-3", "", "", ""),
            case("001-3", "", "", ""),
            case("001-4", "", "", ""),
        ];
        let ids: Vec<&str> = dedupe_cases(&cases).iter().map(|c| c.itemid.as_str()).collect();
        assert_eq!(ids, vec!["001-1", "001-3", "001-4"]);
    }

    #[test]
    fn test_graph_edges_from_scl() {
        let cases = vec![
            case("001-1", "100/10", "ECLI:1", "see 200/20 and 300/30"),
            case("001-2", "200/20;201/20", "ECLI:2", "see 100/10"),
            case("001-3", "300/30", "ECLI:3", "see 201/20 and 999/99"),
        ];
        let graph = CitationGraph::from_cases(&cases);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.citations("001-1"), vec!["001-2", "001-3"]);
        assert_eq!(graph.cited_by("001-2"), vec!["001-1", "001-3"]);
        assert!(graph.citations("missing").is_empty());

        let edges = graph.edges();
        assert_eq!(edges[0], NetworkEdge::references("001-1", "001-2"));
        assert!(edges.iter().all(|e| e.relation_type == "references"));
    }

    #[test]
    fn test_graph_collapses_duplicate_citations() {
        let cases = vec![
            case("001-1", "100/10", "ECLI:1", "200/20; 201/20"),
            case("001-2", "200/20;201/20", "ECLI:2", ""),
        ];
        let graph = CitationGraph::from_cases(&cases);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_graph_ignores_self_citations() {
        let cases = vec![
            case("001-1", "1/10", "ECLI:1", "see 1/10"),
            case("001-2", "2/20", "ECLI:2", "see 2/20 and 1/10"),
        ];
        let graph = CitationGraph::from_cases(&cases);

        assert_eq!(graph.edges(), vec![NetworkEdge::references("001-2", "001-1")]);
        assert!(graph.citations("001-1").is_empty());
    }

    #[test]
    fn test_graph_skips_duplicate_ecli_cases() {
        let cases = vec![
            case("001-1", "100/10", "ECLI:1", ""),
            case("001-9", "100/10", "ECLI:1", ""),
            case("001-2", "200/20", "ECLI:2", "100/10"),
        ];
        let (nodes, edges) = CitationGraph::from_cases(&cases).into_parts();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["001-1", "001-2"]);
        assert_eq!(edges, vec![NetworkEdge::references("001-2", "001-1")]);
    }
}
