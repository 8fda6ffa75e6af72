use std::collections::HashMap;

use serde::Serialize;

use crate::webspace::{Portal, Webspace};

/// Set of loaded webspaces, addressable by webspace and portal key
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebspaceCollection {
    webspaces: Vec<Webspace>,
    #[serde(skip)]
    by_key: HashMap<String, usize>,
}

impl WebspaceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection keeping input order.
    ///
    /// When two webspaces share a key only the first one is kept.
    pub fn from_webspaces(webspaces: impl IntoIterator<Item = Webspace>) -> Self {
        let mut collection = Self::new();
        for webspace in webspaces {
            collection.insert(webspace);
        }
        collection
    }

    /// Add `webspace`; returns false (and drops it) if the key is taken
    pub fn insert(&mut self, webspace: Webspace) -> bool {
        if self.by_key.contains_key(webspace.key()) {
            tracing::warn!(key = webspace.key(), "duplicate webspace key, keeping the first definition");
            return false;
        }

        self.by_key
            .insert(webspace.key().to_string(), self.webspaces.len());
        self.webspaces.push(webspace);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Webspace> {
        self.by_key.get(key).map(|index| &self.webspaces[*index])
    }

    /// Portal with the given key, together with its webspace
    pub fn portal(&self, key: &str) -> Option<(&Webspace, &Portal)> {
        self.webspaces.iter().find_map(|webspace| {
            webspace
                .portal(key)
                .map(|portal| (webspace, portal))
        })
    }

    pub fn portals(&self) -> impl Iterator<Item = (&Webspace, &Portal)> {
        self.webspaces
            .iter()
            .flat_map(|webspace| webspace.portals().iter().map(move |portal| (webspace, portal)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.webspaces.iter().map(Webspace::key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Webspace> {
        self.webspaces.iter()
    }

    pub fn len(&self) -> usize {
        self.webspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.webspaces.is_empty()
    }
}

impl<'a> IntoIterator for &'a WebspaceCollection {
    type Item = &'a Webspace;
    type IntoIter = std::slice::Iter<'a, Webspace>;

    fn into_iter(self) -> Self::IntoIter {
        self.webspaces.iter()
    }
}
