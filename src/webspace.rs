//! In-memory webspace configuration
//!
//! A [`Webspace`] is built once by the loader and read-only afterwards: every
//! field is private and only exposed through accessors.

use serde::Serialize;

use crate::localization::LocalizationTree;

/// A configured content site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Webspace {
    name: String,
    key: String,
    theme: Theme,
    localizations: LocalizationTree,
    segments: Vec<Segment>,
    portals: Vec<Portal>,
}

impl Webspace {
    pub(crate) fn new(name: String, key: String, theme: Theme) -> Self {
        Self {
            name,
            key,
            theme,
            localizations: LocalizationTree::new(),
            segments: Vec::new(),
            portals: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn localizations(&self) -> &LocalizationTree {
        &self.localizations
    }

    pub(crate) fn localizations_mut(&mut self) -> &mut LocalizationTree {
        &mut self.localizations
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_segments(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn segment(&self, key: &str) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.key == key)
    }

    pub(crate) fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portal(&self, key: &str) -> Option<&Portal> {
        self.portals.iter().find(|portal| portal.key == key)
    }

    pub(crate) fn add_portal(&mut self, portal: Portal) {
        self.portals.push(portal);
    }
}

/// Content-audience partition of a webspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    name: String,
    key: String,
}

impl Segment {
    pub(crate) fn new(name: String, key: String) -> Self {
        Self { name, key }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    key: String,
    excluded_templates: Vec<String>,
}

impl Theme {
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            excluded_templates: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn excluded_templates(&self) -> &[String] {
        &self.excluded_templates
    }

    pub fn is_excluded(&self, template: &str) -> bool {
        self.excluded_templates.iter().any(|t| t == template)
    }

    pub(crate) fn add_excluded_template(&mut self, template: String) {
        self.excluded_templates.push(template);
    }
}

/// Deployment unit of a webspace binding localizations to environments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portal {
    name: String,
    key: String,
    resource_locator_strategy: String,
    localizations: LocalizationTree,
    environments: Vec<Environment>,
}

impl Portal {
    pub(crate) fn new(name: String, key: String, resource_locator_strategy: String) -> Self {
        Self {
            name,
            key,
            resource_locator_strategy,
            localizations: LocalizationTree::new(),
            environments: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resource_locator_strategy(&self) -> &str {
        &self.resource_locator_strategy
    }

    pub fn localizations(&self) -> &LocalizationTree {
        &self.localizations
    }

    pub(crate) fn localizations_mut(&mut self) -> &mut LocalizationTree {
        &mut self.localizations
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    /// First environment with the given type tag, e.g. `"prod"`
    pub fn environment(&self, kind: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.kind == kind)
    }

    pub(crate) fn add_environment(&mut self, environment: Environment) {
        self.environments.push(environment);
    }
}

/// Deployment target (dev, stage, prod, ...) of a portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    #[serde(rename = "type")]
    kind: String,
    urls: Vec<Url>,
}

impl Environment {
    pub(crate) fn new(kind: String) -> Self {
        Self {
            kind,
            urls: Vec::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub(crate) fn add_url(&mut self, url: Url) {
        self.urls.push(url);
    }
}

/// URL template of an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Url {
    url: String,
    language: Option<String>,
    country: Option<String>,
    segment: Option<String>,
    redirect: Option<String>,
}

impl Url {
    pub(crate) fn new(url: String) -> Self {
        Self {
            url,
            language: None,
            country: None,
            segment: None,
            redirect: None,
        }
    }

    pub(crate) fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub(crate) fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    pub(crate) fn with_segment(mut self, segment: Option<String>) -> Self {
        self.segment = segment;
        self
    }

    pub(crate) fn with_redirect(mut self, redirect: Option<String>) -> Self {
        self.redirect = redirect;
        self
    }

    /// The pattern, possibly containing `{language}`, `{country}`,
    /// `{segment}` or `{localization}` placeholders
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_webspace() -> Webspace {
        let mut theme = Theme::new("sulu".to_string());
        theme.add_excluded_template("overview".to_string());

        let mut webspace = Webspace::new("Sulu CMF".to_string(), "sulu_io".to_string(), theme);
        webspace.add_segment(Segment::new("Winter".to_string(), "w".to_string()));

        let mut portal = Portal::new(
            "Sulu CMF AT".to_string(),
            "sulucmf_at".to_string(),
            "tree".to_string(),
        );
        let mut prod = Environment::new("prod".to_string());
        prod.add_url(
            Url::new("sulu.at".to_string())
                .with_language(Some("de".to_string()))
                .with_country(Some("at".to_string()))
                .with_segment(Some("w".to_string())),
        );
        prod.add_url(Url::new("www.sulu.at".to_string()).with_redirect(Some("sulu.at".to_string())));
        portal.add_environment(prod);
        portal.add_environment(Environment::new("dev".to_string()));
        webspace.add_portal(portal);

        webspace
    }

    #[test]
    fn test_webspace_accessors() {
        let webspace = sample_webspace();
        assert_eq!(webspace.name(), "Sulu CMF");
        assert_eq!(webspace.key(), "sulu_io");
        assert!(webspace.has_segments());
        assert_eq!(webspace.segment("w").unwrap().name(), "Winter");
        assert!(webspace.segment("s").is_none());
        assert!(webspace.theme().is_excluded("overview"));
        assert!(!webspace.theme().is_excluded("default"));
    }

    #[test]
    fn test_portal_environment_lookup() {
        let webspace = sample_webspace();
        let portal = webspace.portal("sulucmf_at").unwrap();
        assert_eq!(portal.resource_locator_strategy(), "tree");

        let prod = portal.environment("prod").unwrap();
        assert_eq!(prod.urls().len(), 2);
        assert_eq!(prod.urls()[0].language(), Some("de"));
        assert!(!prod.urls()[0].is_redirect());
        assert_eq!(prod.urls()[1].redirect(), Some("sulu.at"));

        assert!(portal.environment("stage").is_none());
        assert!(webspace.portal("missing").is_none());
    }

    #[test]
    fn test_environment_serializes_type_tag() {
        let webspace = sample_webspace();
        let json = serde_json::to_value(&webspace).unwrap();
        assert_eq!(json["portals"][0]["environments"][0]["type"], "prod");
        assert_eq!(json["portals"][0]["environments"][0]["urls"][1]["redirect"], "sulu.at");
        assert_eq!(json["theme"]["excluded_templates"][0], "overview");
    }
}
