//! Overlay-network addressing
//!
//! OCPP 2.1 messages may traverse intermediate networking nodes (local
//! controllers) before reaching the station that must act on them. A request
//! therefore carries a [`Destination`] (where it must arrive) and a
//! [`NetworkPath`] (where it has been), which the receiving side reverses to
//! route the response back.

use serde::{Deserialize, Serialize};

use crate::ids::NetworkingNodeId;

/// Routing target of a request: a single node, or an explicit source-routed
/// path through intermediate nodes ending at the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Destination {
    Node(NetworkingNodeId),
    Route(Vec<NetworkingNodeId>),
}

impl Destination {
    /// Address a single node directly
    pub fn node(id: impl Into<NetworkingNodeId>) -> Self {
        Destination::Node(id.into())
    }

    /// Source-route through the given hops; the last hop is the target.
    /// A single-hop route collapses to direct addressing.
    pub fn route(hops: Vec<NetworkingNodeId>) -> Self {
        match hops.len() {
            1 => {
                let mut hops = hops;
                Destination::Node(hops.remove(0))
            }
            _ => Destination::Route(hops),
        }
    }

    /// The node that must ultimately act on the request, if the destination
    /// is well-formed (an empty route has no target).
    pub fn final_node(&self) -> Option<&NetworkingNodeId> {
        match self {
            Destination::Node(id) => Some(id),
            Destination::Route(hops) => hops.last(),
        }
    }

    /// Intermediate hops, excluding the final target
    pub fn intermediate_hops(&self) -> &[NetworkingNodeId] {
        match self {
            Destination::Node(_) => &[],
            Destination::Route(hops) => {
                if hops.is_empty() {
                    &[]
                } else {
                    &hops[..hops.len() - 1]
                }
            }
        }
    }
}

impl From<NetworkingNodeId> for Destination {
    fn from(id: NetworkingNodeId) -> Self {
        Destination::Node(id)
    }
}

/// Nodes a message has traversed so far, in order. Used for response
/// routing and loop detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkPath(Vec<NetworkingNodeId>);

impl NetworkPath {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Path starting at the given node (the message source)
    pub fn from_source(source: impl Into<NetworkingNodeId>) -> Self {
        Self(vec![source.into()])
    }

    /// Append a hop. Returns `false` without recording the hop if the node
    /// is already on the path (a routing loop).
    pub fn push(&mut self, node: NetworkingNodeId) -> bool {
        if self.contains(&node) {
            return false;
        }
        self.0.push(node);
        true
    }

    pub fn contains(&self, node: &NetworkingNodeId) -> bool {
        self.0.contains(node)
    }

    /// The path a response must take: traversed hops in reverse
    pub fn reversed(&self) -> Self {
        let mut hops = self.0.clone();
        hops.reverse();
        Self(hops)
    }

    pub fn hops(&self) -> &[NetworkingNodeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_serde_shapes() {
        // Direct addressing serializes as a bare string, routes as an array
        let d = Destination::node("CS001");
        assert_eq!(serde_json::to_value(&d).unwrap(), serde_json::json!("CS001"));

        let r = Destination::route(vec!["LC1".into(), "CS001".into()]);
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!(["LC1", "CS001"])
        );

        let parsed: Destination = serde_json::from_str("\"CS001\"").unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn test_single_hop_route_collapses() {
        let d = Destination::route(vec!["CS001".into()]);
        assert_eq!(d, Destination::node("CS001"));
        assert_eq!(d.final_node().unwrap().as_str(), "CS001");
    }

    #[test]
    fn test_network_path_loop_detection() {
        let mut path = NetworkPath::from_source("CSMS");
        assert!(path.push("LC1".into()));
        assert!(!path.push("CSMS".into()));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_reversed_path() {
        let mut path = NetworkPath::from_source("CSMS");
        path.push("LC1".into());
        path.push("CS001".into());

        let reversed = path.reversed();
        let back: Vec<&str> = reversed.hops().iter().map(|n| n.as_str()).collect();
        assert_eq!(back, vec!["CS001", "LC1", "CSMS"]);
    }
}
