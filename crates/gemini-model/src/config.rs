use std::env;
use std::fmt::Debug;

const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Builder for [`GeminiConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
    /// Creates an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the process environment.
    ///
    /// The key is read from `GEMINI_API_KEY`, falling back to `API_KEY`.
    /// `GEMINI_MODEL` and `GEMINI_BASE_URL` override the defaults. Unset
    /// and blank variables are left out, so a missing key is reported by
    /// [`GeminiConfig::has_api_key`] rather than here.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };
        Self {
            api_key: non_blank("GEMINI_API_KEY")
                .or_else(|| non_blank("API_KEY")),
            model: non_blank("GEMINI_MODEL"),
            base_url: non_blank("GEMINI_BASE_URL"),
        }
    }

    /// Sets the API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> GeminiConfig {
        let api_key = self
            .api_key
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty());
        let model = self
            .model
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_owned();
        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Gemini provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) base_url: String,
}

impl GeminiConfig {
    /// Returns whether a non-empty API key is configured.
    #[inline]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeminiConfigBuilder::new().build();
        assert!(!config.has_api_key());
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(
            config.stream_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/\
             gemini-3-flash-preview:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = GeminiConfigBuilder::new().with_api_key("   ").build();
        assert!(!config.has_api_key());
    }

    fn lookup_in(
        vars: &[(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |name: &str| vars.get(name).map(|value| value.to_string())
    }

    #[test]
    fn test_env_key_fallback() {
        let config = GeminiConfigBuilder::from_lookup(lookup_in(&[
            ("GEMINI_API_KEY", ""),
            ("API_KEY", "fallback"),
        ]))
        .build();
        assert_eq!(config.api_key.as_deref(), Some("fallback"));

        let config = GeminiConfigBuilder::from_lookup(lookup_in(&[
            ("GEMINI_API_KEY", "primary"),
            ("API_KEY", "fallback"),
        ]))
        .build();
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config = GeminiConfigBuilder::from_lookup(lookup_in(&[
            ("GEMINI_API_KEY", "  "),
            ("GEMINI_MODEL", ""),
        ]))
        .build();
        assert!(!config.has_api_key());
        assert_eq!(config.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_overrides() {
        let config = GeminiConfigBuilder::new()
            .with_api_key("secret")
            .with_model("gemini-2.5-pro")
            .with_base_url("http://localhost:8080/")
            .build();
        assert!(config.has_api_key());
        assert_eq!(
            config.stream_url(),
            "http://localhost:8080/models/gemini-2.5-pro:streamGenerateContent?alt=sse"
        );
        assert!(!format!("{config:?}").contains("secret"));
    }
}
