//! Platform catalog: the static probe definitions a session runs against.
//!
//! A catalog is an ordered map from platform name to [`PlatformDefinition`].
//! It is parsed once (from the built-in data, a JSON string, or a JSON file)
//! and shared read-only by every worker of a session.

use crate::error::HandleCheckError;
use crate::probe::ProbeStrategy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Placeholder substituted with the target username in URL templates.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Catalog shipped with the library.
const BUILTIN_CATALOG: &str = include_str!("../data/platforms.json");

pub const DEFAULT_NOT_FOUND_INDICATORS: &[&str] = &[
    "user not found",
    "profile not found",
    "page not found",
    "does not exist",
    "user does not exist",
];

pub const DEFAULT_FOUND_INDICATORS: &[&str] = &["profile", "posts", "followers", "following"];

pub const DEFAULT_REDIRECT_INDICATORS: &[&str] = &["/signin", "/login", "/register", "/404", "/error"];

pub const DEFAULT_EXISTS_FIELD: &str = "exists";

/// How to probe one platform. Field names match the catalog JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDefinition {
    /// Free-form category tag ("social_media", "developer", ...)
    #[serde(default = "default_category")]
    pub category: String,

    /// Profile URL template containing `{username}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,

    /// API URL template, required by the API strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// HTTP method used for the exchange
    #[serde(default = "default_method")]
    pub method: String,

    /// Extra request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_indicators: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_indicators: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_indicators: Option<Vec<String>>,

    /// JSON field whose truthiness tells whether the account exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists_field: Option<String>,

    /// Strategy selector; absent or unrecognized means status-code probing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker_type: Option<String>,

    /// Host names that belong to the platform, for URL lookups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
}

fn default_category() -> String {
    "unknown".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

impl Default for PlatformDefinition {
    fn default() -> Self {
        Self {
            category: default_category(),
            url_pattern: None,
            api_url: None,
            method: default_method(),
            headers: BTreeMap::new(),
            not_found_indicators: None,
            found_indicators: None,
            redirect_indicators: None,
            exists_field: None,
            checker_type: None,
            domains: Vec::new(),
        }
    }
}

impl PlatformDefinition {
    /// Create a status-code definition for the given profile template.
    pub fn new<S: Into<String>>(url_pattern: S) -> Self {
        Self {
            url_pattern: Some(url_pattern.into()),
            ..Default::default()
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_strategy(mut self, strategy: ProbeStrategy) -> Self {
        self.checker_type = Some(strategy.name().to_string());
        self
    }

    pub fn with_api_url<S: Into<String>>(mut self, api_url: S) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// The strategy this platform asks for.
    pub fn strategy(&self) -> ProbeStrategy {
        ProbeStrategy::resolve(self.checker_type.as_deref())
    }

    /// Render the profile URL for `username`.
    ///
    /// Fails with a configuration error when the definition has no template.
    pub fn profile_url(&self, platform: &str, username: &str) -> Result<String, HandleCheckError> {
        self.url_pattern
            .as_deref()
            .map(|pattern| render_template(pattern, username))
            .ok_or_else(|| {
                HandleCheckError::config(format!(
                    "platform '{}' has no url_pattern",
                    platform
                ))
            })
    }

    /// Render the API URL for `username`, if the platform has one.
    pub fn api_url_for(&self, username: &str) -> Option<String> {
        self.api_url
            .as_deref()
            .map(|pattern| render_template(pattern, username))
    }

    pub fn not_found_markers(&self) -> Vec<&str> {
        markers_or_default(&self.not_found_indicators, DEFAULT_NOT_FOUND_INDICATORS)
    }

    pub fn found_markers(&self) -> Vec<&str> {
        markers_or_default(&self.found_indicators, DEFAULT_FOUND_INDICATORS)
    }

    pub fn redirect_markers(&self) -> Vec<&str> {
        markers_or_default(&self.redirect_indicators, DEFAULT_REDIRECT_INDICATORS)
    }

    pub fn exists_field(&self) -> &str {
        self.exists_field.as_deref().unwrap_or(DEFAULT_EXISTS_FIELD)
    }
}

fn markers_or_default<'a>(configured: &'a Option<Vec<String>>, default: &[&'static str]) -> Vec<&'a str> {
    match configured {
        Some(markers) => markers.iter().map(String::as_str).collect(),
        None => default.to_vec(),
    }
}

/// Substitute the username placeholder in a URL template.
pub fn render_template(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, username)
}

/// The full set of configured platforms.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    platforms: BTreeMap<String, PlatformDefinition>,
}

impl Catalog {
    /// Build a catalog from (name, definition) pairs.
    ///
    /// Names must be non-empty, free of surrounding whitespace and unique
    /// ignoring case, because filtering by platform name is case-insensitive.
    pub fn from_definitions<I, S>(definitions: I) -> Result<Self, HandleCheckError>
    where
        I: IntoIterator<Item = (S, PlatformDefinition)>,
        S: Into<String>,
    {
        let mut platforms = BTreeMap::new();
        let mut seen: HashMap<String, String> = HashMap::new();

        for (name, definition) in definitions {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(HandleCheckError::config("Platform names cannot be empty"));
            }
            if name.trim() != name {
                return Err(HandleCheckError::config(format!(
                    "Platform name '{}' has leading or trailing whitespace",
                    name
                )));
            }
            if let Some(previous) = seen.insert(name.to_lowercase(), name.clone()) {
                return Err(HandleCheckError::config(format!(
                    "Duplicate platform name '{}' (conflicts with '{}')",
                    name, previous
                )));
            }
            platforms.insert(name, definition);
        }

        Ok(Self { platforms })
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, HandleCheckError> {
        let raw: BTreeMap<String, PlatformDefinition> = serde_json::from_str(json)
            .map_err(|e| HandleCheckError::parse(format!("Invalid platform catalog: {}", e)))?;
        Self::from_definitions(raw)
    }

    /// Load a catalog from a JSON file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, HandleCheckError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HandleCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read platform catalog: {}", e),
            )
        })?;

        let catalog = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), platforms = catalog.len(), "loaded platform catalog");
        Ok(catalog)
    }

    /// The catalog embedded in the library.
    pub fn builtin() -> Result<Self, HandleCheckError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlatformDefinition)> {
        self.platforms.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Distinct categories present in the catalog, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.platforms
            .values()
            .map(|def| def.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All platform names, sorted.
    pub fn platform_names(&self) -> Vec<String> {
        self.platforms.keys().cloned().collect()
    }

    /// Identify the platform a URL belongs to by its configured domains.
    pub fn platform_for_url(&self, url: &str) -> Option<&str> {
        let url = url.to_lowercase();
        self.iter()
            .find(|(_, def)| {
                def.domains
                    .iter()
                    .any(|domain| url.contains(&domain.to_lowercase()))
            })
            .map(|(name, _)| name)
    }

    /// Apply the category and platform-name filters (case-insensitive, combined
    /// as an intersection). With neither filter every platform is returned.
    pub fn select(
        &self,
        category: Option<&str>,
        platforms: Option<&[String]>,
    ) -> Vec<(&str, &PlatformDefinition)> {
        let category = category.map(str::to_lowercase);
        let wanted: Option<BTreeSet<String>> =
            platforms.map(|names| names.iter().map(|n| n.trim().to_lowercase()).collect());

        self.iter()
            .filter(|(_, def)| match &category {
                Some(category) => def.category.to_lowercase() == *category,
                None => true,
            })
            .filter(|(name, _)| match &wanted {
                Some(wanted) => wanted.contains(&name.to_lowercase()),
                None => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "GitHub": {
            "url_pattern": "https://github.com/{username}",
            "api_url": "https://api.github.com/users/{username}",
            "category": "developer",
            "checker_type": "api",
            "headers": {"Accept": "application/vnd.github+json"}
        },
        "Steam": {
            "url_pattern": "https://steamcommunity.com/id/{username}",
            "category": "gaming",
            "checker_type": "profile",
            "not_found_indicators": ["The specified profile could not be found"]
        },
        "Bare": {
            "url_pattern": "https://bare.test/{username}",
            "domains": ["bare.test", "www.bare.test"]
        }
    }"#;

    #[test]
    fn test_parse_applies_defaults() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);

        let bare = catalog.get("Bare").unwrap();
        assert_eq!(bare.category, "unknown");
        assert_eq!(bare.method, "GET");
        assert_eq!(bare.strategy(), ProbeStrategy::StatusCode);
        assert_eq!(bare.not_found_markers(), DEFAULT_NOT_FOUND_INDICATORS.to_vec());
        assert_eq!(bare.found_markers(), DEFAULT_FOUND_INDICATORS.to_vec());
        assert_eq!(bare.redirect_markers(), DEFAULT_REDIRECT_INDICATORS.to_vec());
        assert_eq!(bare.exists_field(), "exists");

        let github = catalog.get("GitHub").unwrap();
        assert_eq!(github.strategy(), ProbeStrategy::Api);
        assert_eq!(
            github.headers.get("Accept").map(String::as_str),
            Some("application/vnd.github+json")
        );

        let steam = catalog.get("Steam").unwrap();
        assert_eq!(
            steam.not_found_markers(),
            vec!["The specified profile could not be found"]
        );
    }

    #[test]
    fn test_render_urls() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let github = catalog.get("GitHub").unwrap();
        assert_eq!(
            github.profile_url("GitHub", "alice").unwrap(),
            "https://github.com/alice"
        );
        assert_eq!(
            github.api_url_for("alice").as_deref(),
            Some("https://api.github.com/users/alice")
        );
    }

    #[test]
    fn test_missing_url_pattern_is_config_error() {
        let def = PlatformDefinition::default();
        let err = def.profile_url("Broken", "alice").unwrap_err();
        assert!(matches!(err, HandleCheckError::ConfigError { .. }));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_case_insensitive_duplicates_rejected() {
        let result = Catalog::from_definitions(vec![
            ("GitHub", PlatformDefinition::new("https://github.com/{username}")),
            ("github", PlatformDefinition::new("https://github.com/{username}")),
        ]);
        assert!(matches!(result, Err(HandleCheckError::ConfigError { .. })));
    }

    #[test]
    fn test_padded_names_rejected() {
        let json = r#"{" GitHub": {"url_pattern": "https://github.com/{username}"}}"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, HandleCheckError::ConfigError { .. }));
        assert!(err.to_string().contains("' GitHub'"));

        let result = Catalog::from_definitions(vec![(
            "   ",
            PlatformDefinition::new("https://x.test/{username}"),
        )]);
        assert!(matches!(result, Err(HandleCheckError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = Catalog::from_json_str("{ not json");
        assert!(matches!(result, Err(HandleCheckError::ParseError { .. })));
    }

    #[test]
    fn test_categories_and_names_sorted() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.categories(), vec!["developer", "gaming", "unknown"]);
        assert_eq!(catalog.platform_names(), vec!["Bare", "GitHub", "Steam"]);
    }

    #[test]
    fn test_select_filters() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();

        assert_eq!(catalog.select(None, None).len(), 3);

        let gaming = catalog.select(Some("GAMING"), None);
        assert_eq!(gaming.len(), 1);
        assert_eq!(gaming[0].0, "Steam");

        let named = catalog.select(None, Some(&["github".to_string(), "BARE".to_string()]));
        let names: Vec<&str> = named.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Bare", "GitHub"]);

        // Intersection of both filters
        let both = catalog.select(Some("developer"), Some(&["steam".to_string()]));
        assert!(both.is_empty());
    }

    #[test]
    fn test_platform_for_url() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.platform_for_url("https://WWW.Bare.test/alice"), Some("Bare"));
        assert_eq!(catalog.platform_for_url("https://github.com/alice"), None);
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= 30);
        for (name, def) in catalog.iter() {
            let url = def.profile_url(name, "alice").unwrap();
            assert!(url.starts_with("https://"), "{} has non-https url {}", name, url);
            assert!(url.contains("alice"), "{} template lacks placeholder", name);
            if def.strategy() == ProbeStrategy::Api {
                assert!(def.api_url.is_some(), "{} is an API probe without api_url", name);
            }
        }
    }

    #[test]
    fn test_load_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let catalog = Catalog::load_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);

        let missing = Catalog::load_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(HandleCheckError::FileError { .. })));
    }
}
