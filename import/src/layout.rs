//! Target shape of an imported fragment.

use serde::{Deserialize, Serialize};

/// Labels and relations the importer uses to hang a fragment under a
/// container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLayout {
    /// Labels that mark a vertex as a container already.
    pub container_labels: Vec<String>,
    /// Label of a synthesized container.
    pub parent_label: String,
    /// Label of roots attached through `attribute_relation`.
    pub attribute_label: String,
    pub attribute_relation: String,
    /// Prefix of the per-label group relation (`has` + `Button`).
    pub group_relation_prefix: String,
    /// Group used for roots that carry no label.
    pub fallback_group: String,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            container_labels: vec!["Container".into(), "Page".into(), "Block".into()],
            parent_label: "Container".into(),
            attribute_label: "Attribute".into(),
            attribute_relation: "attributes".into(),
            group_relation_prefix: "has".into(),
            fallback_group: "Node".into(),
        }
    }
}

impl ImportLayout {
    pub fn is_container_label(&self, label: &str) -> bool {
        self.container_labels.iter().any(|l| l == label)
    }

    /// Relation for a root whose primary label is `label`.
    pub fn group_relation(&self, label: Option<&str>) -> String {
        format!(
            "{}{}",
            self.group_relation_prefix,
            label.unwrap_or(self.fallback_group.as_str())
        )
    }
}
