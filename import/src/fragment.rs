//! Statically authored graph fragments.

use pagegraph_core::{Edge, EdgeId, Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ImportResult;

/// A list of entities, or a map of them keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    List(Vec<T>),
    Map(BTreeMap<String, T>),
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection::List(Vec::new())
    }
}

impl<T> Collection<T> {
    pub fn len(&self) -> usize {
        match self {
            Collection::List(items) => items.len(),
            Collection::Map(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `{vertexes, edges}` with author-time ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub vertexes: Collection<Vertex>,
    #[serde(default)]
    pub edges: Collection<Edge>,
}

impl Fragment {
    pub fn new(vertexes: Vec<Vertex>, edges: Vec<Edge>) -> Self {
        Self {
            vertexes: Collection::List(vertexes),
            edges: Collection::List(edges),
        }
    }

    /// Parse a fragment from JSON.
    pub fn from_json(raw: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Vertices in authoring order. Map entries without an `id` take their
    /// key.
    pub fn vertex_list(&self) -> Vec<Vertex> {
        match &self.vertexes {
            Collection::List(items) => items.clone(),
            Collection::Map(items) => items
                .iter()
                .map(|(key, v)| {
                    let mut v = v.clone();
                    if v.id.as_str().is_empty() {
                        v.id = VertexId::new(key.as_str());
                    }
                    v
                })
                .collect(),
        }
    }

    /// Edges in authoring order. Map entries without an `id` take their key.
    pub fn edge_list(&self) -> Vec<Edge> {
        match &self.edges {
            Collection::List(items) => items.clone(),
            Collection::Map(items) => items
                .iter()
                .map(|(key, e)| {
                    let mut e = e.clone();
                    if e.id.as_str().is_empty() {
                        e.id = EdgeId::new(key.as_str());
                    }
                    e
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_form() {
        // GIVEN
        let raw = r#"{
            "vertexes": [{"id": "a", "L": ["Button"], "P": {"text": "OK"}}],
            "edges": []
        }"#;

        // WHEN
        let fragment = Fragment::from_json(raw).unwrap();

        // THEN
        let vertexes = fragment.vertex_list();
        assert_eq!(vertexes.len(), 1);
        assert_eq!(vertexes[0].primary_label(), Some("Button"));
        assert!(fragment.edges.is_empty());
    }

    #[test]
    fn test_parse_map_form_fills_ids_from_keys() {
        // GIVEN
        let raw = r#"{
            "vertexes": {"a": {"L": ["Button"]}, "b": {"L": ["Label"]}},
            "edges": {"e": {"S": "a", "E": "b", "T": "child"}}
        }"#;

        // WHEN
        let fragment = Fragment::from_json(raw).unwrap();

        // THEN
        let ids: Vec<_> = fragment.vertex_list().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![VertexId::new("a"), VertexId::new("b")]);
        assert_eq!(fragment.edge_list()[0].id, EdgeId::new("e"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let fragment = Fragment::from_json("{}").unwrap();

        assert!(fragment.vertexes.is_empty());
        assert!(fragment.edges.is_empty());
    }

    #[test]
    fn test_malformed_fragment() {
        assert!(Fragment::from_json(r#"{"vertexes": 3}"#).is_err());
    }
}
