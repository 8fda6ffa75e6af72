//! Webspace XML loader
//!
//! Turns a webspace document into a [`Webspace`]. Loading is a single pass:
//! the file is located, checked against the bundled XSD, parsed, and walked
//! in document order. The first problem aborts the load; no partially built
//! webspace is ever returned.
//!
//! The builder functions take the document node and the webspace under
//! construction as explicit arguments, so a loader holds no per-load state
//! and can be shared between threads.

use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{Result, WebspaceError};
use crate::localization::{LocalizationId, LocalizationTree};
use crate::locator::FileLocator;
use crate::schema::{WEBSPACE_NAMESPACE, WebspaceSchema};
use crate::webspace::{Environment, Portal, Segment, Theme, Url, Webspace};

/// Loads webspace definitions from `*.xml` files
#[derive(Debug, Clone)]
pub struct XmlFileLoader {
    locator: FileLocator,
    validate_schema: bool,
}

impl XmlFileLoader {
    /// Loader that validates every document against the bundled XSD
    pub fn new(locator: FileLocator) -> Self {
        Self {
            locator,
            validate_schema: true,
        }
    }

    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.validate_schema = enabled;
        self
    }

    pub fn validates_schema(&self) -> bool {
        self.validate_schema
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    /// Only resources with the exact extension `xml` are supported
    pub fn supports(resource: &Path) -> bool {
        resource.extension().and_then(|ext| ext.to_str()) == Some("xml")
    }

    /// Load the webspace defined by `resource`.
    ///
    /// # Errors
    ///
    /// - `ResourceNotFound` if the locator cannot find the file
    /// - `UnsupportedResource` if it is not an `.xml` file
    /// - `ConfigFormat` if it is not well-formed, violates the schema, or
    ///   lacks a required element or attribute
    /// - `InvalidUrlDefinition` for the first URL without enough
    ///   language/country/segment information
    pub fn load(&self, resource: impl AsRef<Path>) -> Result<Webspace> {
        let resource = resource.as_ref();
        if !Self::supports(resource) {
            return Err(WebspaceError::UnsupportedResource {
                path: resource.to_path_buf(),
            });
        }

        let path = self.locator.locate(resource)?;

        if self.validate_schema {
            WebspaceSchema::load()?.validate(&path)?;
        }

        let content = std::fs::read_to_string(&path).map_err(|source| WebspaceError::Io {
            path: path.clone(),
            source,
        })?;

        parse_webspace(&content, &path)
    }
}

/// Build a webspace from an in-memory document.
///
/// `source` is only used in error messages. No XSD validation happens here;
/// structural requirements are still enforced while walking the document.
pub fn parse_webspace(xml: &str, source: &Path) -> Result<Webspace> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options)
        .map_err(|e| WebspaceError::format(source, e.to_string()))?;
    let root = document.root_element();

    if !is_element(root, "webspace") {
        return Err(WebspaceError::format(
            source,
            format!(
                "root element must be <webspace> in namespace {}",
                WEBSPACE_NAMESPACE
            ),
        ));
    }

    let name = required_text(root, "name", source)?;
    let key = required_text(root, "key", source)?;
    let theme = build_theme(root, source)?;

    let mut webspace = Webspace::new(name, key, theme);

    for node in path(root, &["localizations", "localization"]) {
        build_localization(node, false, None, webspace.localizations_mut(), source)?;
    }

    for node in path(root, &["segments", "segment"]) {
        let key = required_attribute(node, "key", source)?;
        webspace.add_segment(Segment::new(text_content(node), key));
    }

    for portal_node in path(root, &["portals", "portal"]) {
        let portal = build_portal(root, portal_node, &webspace, source)?;
        webspace.add_portal(portal);
    }

    Ok(webspace)
}

fn build_theme(root: Node, source: &Path) -> Result<Theme> {
    let theme_node = required_child(root, "theme", source)?;
    let mut theme = Theme::new(required_text(theme_node, "key", source)?);

    for template in path(theme_node, &["excluded", "template"]) {
        theme.add_excluded_template(text_content(template));
    }

    Ok(theme)
}

/// Add `node` (and, unless `flat`, its nested localizations) to `tree`.
fn build_localization(
    node: Node,
    flat: bool,
    parent: Option<LocalizationId>,
    tree: &mut LocalizationTree,
    source: &Path,
) -> Result<LocalizationId> {
    let language = required_attribute(node, "language", source)?;
    let country = optional_attribute(node, "country");
    let shadow = optional_attribute(node, "shadow");

    if tree.find(&language, country.as_deref()).is_some() {
        let code = match &country {
            Some(country) => format!("{}_{}", language, country),
            None => language.clone(),
        };
        return Err(WebspaceError::format(
            source,
            format!("duplicate localization '{}'", code),
        ));
    }

    let id = tree.push(parent, language, country, shadow);

    if !flat {
        for child in children(node, "localization") {
            build_localization(child, flat, Some(id), tree, source)?;
        }
    }

    Ok(id)
}

fn build_portal(root: Node, portal_node: Node, webspace: &Webspace, source: &Path) -> Result<Portal> {
    let strategy_node = path(portal_node, &["resource-locator", "strategy"])
        .next()
        .ok_or_else(|| {
            WebspaceError::format(source, "missing element <resource-locator><strategy>")
        })?;

    let mut portal = Portal::new(
        required_text(portal_node, "name", source)?,
        required_text(portal_node, "key", source)?,
        text_content(strategy_node),
    );

    build_portal_localizations(root, portal_node, &mut portal, source)?;

    for environment_node in path(portal_node, &["environments", "environment"]) {
        let environment = build_environment(environment_node, webspace, source)?;
        portal.add_environment(environment);
    }

    Ok(portal)
}

/// A portal either declares its own localizations or inherits every
/// webspace localization, flattened to roots without children. A
/// `<localizations>` element without any `<localization>` inside counts as
/// not declared.
fn build_portal_localizations(
    root: Node,
    portal_node: Node,
    portal: &mut Portal,
    source: &Path,
) -> Result<()> {
    let declares_own = children(portal_node, "localizations")
        .flat_map(|localizations| localizations.descendants())
        .any(|node| is_element(node, "localization"));

    if declares_own {
        for node in path(portal_node, &["localizations", "localization"]) {
            build_localization(node, false, None, portal.localizations_mut(), source)?;
        }
    } else {
        let inherited = children(root, "localizations")
            .flat_map(|localizations| localizations.descendants())
            .filter(|node| is_element(*node, "localization"));

        for node in inherited {
            build_localization(node, true, None, portal.localizations_mut(), source)?;
        }
    }

    Ok(())
}

fn build_environment(node: Node, webspace: &Webspace, source: &Path) -> Result<Environment> {
    let mut environment = Environment::new(required_attribute(node, "type", source)?);

    for url_node in path(node, &["urls", "url"]) {
        let pattern = text_content(url_node);
        let attributes = UrlAttributes::from_node(url_node);

        if !check_url(&pattern, &attributes, webspace.has_segments()) {
            return Err(WebspaceError::InvalidUrlDefinition {
                webspace: webspace.key().to_string(),
                url: pattern,
            });
        }

        environment.add_url(
            Url::new(pattern)
                .with_language(attributes.language)
                .with_country(attributes.country)
                .with_segment(attributes.segment)
                .with_redirect(attributes.redirect),
        );
    }

    Ok(environment)
}

/// Optional attributes of a `<url>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlAttributes {
    pub language: Option<String>,
    pub country: Option<String>,
    pub segment: Option<String>,
    pub localization: Option<String>,
    pub redirect: Option<String>,
}

impl UrlAttributes {
    fn from_node(node: Node) -> Self {
        Self {
            language: optional_attribute(node, "language"),
            country: optional_attribute(node, "country"),
            segment: optional_attribute(node, "segment"),
            localization: optional_attribute(node, "localization"),
            redirect: optional_attribute(node, "redirect"),
        }
    }
}

/// Whether a URL carries enough information to be resolved.
///
/// Language and country may come from an attribute, from the matching
/// placeholder, or from a `localization` attribute / `{localization}`
/// placeholder. A segment is only needed when the webspace declares
/// segments. Redirect URLs are always accepted.
pub fn check_url(pattern: &str, attributes: &UrlAttributes, webspace_has_segments: bool) -> bool {
    let has_localization =
        attributes.localization.is_some() || pattern.contains("{localization}");

    let has_language =
        attributes.language.is_some() || pattern.contains("{language}") || has_localization;

    let has_country =
        attributes.country.is_some() || pattern.contains("{country}") || has_localization;

    let has_segment = !webspace_has_segments
        || attributes.segment.is_some()
        || pattern.contains("{segment}");

    let has_redirect = attributes.redirect.is_some();

    (has_language && has_country && has_segment) || has_redirect
}

fn is_element(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(WEBSPACE_NAMESPACE)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |child| is_element(*child, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_element(*child, name))
}

/// Elements reached by following `steps` child by child, in document order
fn path<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    steps: &'a [&'a str],
) -> Box<dyn Iterator<Item = Node<'a, 'input>> + 'a> {
    match steps.split_first() {
        None => Box::new(std::iter::once(node)),
        Some((first, rest)) => Box::new(children(node, first).flat_map(move |c| path(c, rest))),
    }
}

/// Concatenated text of all descendant text nodes, like a DOM `nodeValue`
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn required_child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
    source: &Path,
) -> Result<Node<'a, 'input>> {
    child(node, name).ok_or_else(|| {
        WebspaceError::format(
            source,
            format!(
                "missing element <{}> in <{}>",
                name,
                node.tag_name().name()
            ),
        )
    })
}

fn required_text(node: Node, name: &str, source: &Path) -> Result<String> {
    required_child(node, name, source).map(text_content)
}

fn required_attribute(node: Node, name: &str, source: &Path) -> Result<String> {
    node.attribute(name).map(str::to_string).ok_or_else(|| {
        WebspaceError::format(
            source,
            format!(
                "missing attribute '{}' on <{}>",
                name,
                node.tag_name().name()
            ),
        )
    })
}

fn optional_attribute(node: Node, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}
