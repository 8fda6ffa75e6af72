//! Localization trees
//!
//! Localizations nest (`en` → `en_us`, `en_ca`), so a webspace or portal owns a
//! small tree of them. Nodes live in a flat arena in document pre-order; each
//! node keeps the ids of its children and, for upward lookups only, the id of
//! its parent. Traversal order and serialization never follow the parent link.

use std::fmt;

use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

/// Index of a localization inside its [`LocalizationTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalizationId(usize);

impl LocalizationId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A language, optionally refined by a country
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localization {
    id: LocalizationId,
    language: String,
    country: Option<String>,
    shadow: Option<String>,
    parent: Option<LocalizationId>,
    children: Vec<LocalizationId>,
}

impl Localization {
    pub fn id(&self) -> LocalizationId {
        self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Locale whose content this localization shows instead of its own
    pub fn shadow(&self) -> Option<&str> {
        self.shadow.as_deref()
    }

    pub fn parent(&self) -> Option<LocalizationId> {
        self.parent
    }

    pub fn children(&self) -> &[LocalizationId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// `language` or `language{delimiter}country`, e.g. `de_at`
    pub fn code(&self, delimiter: &str) -> String {
        match &self.country {
            Some(country) => format!("{}{}{}", self.language, delimiter, country),
            None => self.language.clone(),
        }
    }

    /// Whether this localization has the given language/country pair
    pub fn matches(&self, language: &str, country: Option<&str>) -> bool {
        self.language == language && self.country.as_deref() == country
    }
}

impl fmt::Display for Localization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code("_"))
    }
}

/// Arena-backed, ordered forest of localizations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizationTree {
    nodes: Vec<Localization>,
    roots: Vec<LocalizationId>,
}

impl LocalizationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as a new root) and return its id.
    ///
    /// Nodes must be pushed in document pre-order so that [`Self::iter`]
    /// reflects the source order.
    pub(crate) fn push(
        &mut self,
        parent: Option<LocalizationId>,
        language: String,
        country: Option<String>,
        shadow: Option<String>,
    ) -> LocalizationId {
        let id = LocalizationId(self.nodes.len());
        self.nodes.push(Localization {
            id,
            language,
            country,
            shadow,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    pub fn get(&self, id: LocalizationId) -> Option<&Localization> {
        self.nodes.get(id.0)
    }

    /// Top-level localizations in document order
    pub fn roots(&self) -> impl Iterator<Item = &Localization> {
        self.roots.iter().map(|id| &self.nodes[id.0])
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn children_of(&self, id: LocalizationId) -> impl Iterator<Item = &Localization> {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|child| &self.nodes[child.0])
    }

    pub fn parent_of(&self, id: LocalizationId) -> Option<&Localization> {
        self.nodes
            .get(id.0)
            .and_then(|node| node.parent)
            .map(|parent| &self.nodes[parent.0])
    }

    /// Number of ancestors; roots have depth 0
    pub fn depth(&self, id: LocalizationId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }

    /// Every localization, in document pre-order
    pub fn iter(&self) -> impl Iterator<Item = &Localization> {
        self.nodes.iter()
    }

    pub fn find(&self, language: &str, country: Option<&str>) -> Option<&Localization> {
        self.nodes.iter().find(|node| node.matches(language, country))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Codes of every localization in document order, e.g. `["en", "en_us"]`
    pub fn codes(&self, delimiter: &str) -> Vec<String> {
        self.nodes.iter().map(|node| node.code(delimiter)).collect()
    }
}

impl Serialize for LocalizationTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.roots.len()))?;
        for root in &self.roots {
            seq.serialize_element(&NodeView {
                tree: self,
                id: *root,
            })?;
        }
        seq.end()
    }
}

/// Serializes one node with its subtree nested under `children`
struct NodeView<'a> {
    tree: &'a LocalizationTree,
    id: LocalizationId,
}

struct ChildrenView<'a> {
    tree: &'a LocalizationTree,
    ids: &'a [LocalizationId],
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = &self.tree.nodes[self.id.0];
        let mut state = serializer.serialize_struct("Localization", 4)?;
        state.serialize_field("language", &node.language)?;
        state.serialize_field("country", &node.country)?;
        state.serialize_field("shadow", &node.shadow)?;
        state.serialize_field(
            "children",
            &ChildrenView {
                tree: self.tree,
                ids: &node.children,
            },
        )?;
        state.end()
    }
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.ids.len()))?;
        for id in self.ids {
            seq.serialize_element(&NodeView {
                tree: self.tree,
                id: *id,
            })?;
        }
        seq.end()
    }
}
