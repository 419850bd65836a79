//! Site configuration
//!
//! The theme flags come from the Jekyll data file (`_data/theme.yml`) that
//! the site exposes to scripts as `site.data.theme`. Every flag is on unless
//! explicitly set to `false`.
//!
//! Natively the flags are merged with Figment: serialized defaults, then the
//! theme file, then `SITE_THEME_*` environment variables. In the browser the
//! shell deserializes the injected object directly.

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Pin the media area while the transcript scrolls
    #[serde(rename = "mediaScroll", default = "enabled")]
    pub media_scroll: bool,

    #[serde(rename = "searchAndFilters", default = "enabled")]
    pub search_and_filters: bool,

    /// Show the sticky filter tab once the reader scrolls past the header
    #[serde(rename = "searchAndFiltersSticky", default = "enabled")]
    pub search_and_filters_sticky: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self { media_scroll: true, search_and_filters: true, search_and_filters_sticky: true }
    }
}

impl ThemeConfig {
    /// The sticky tab needs both the panel and its sticky variant.
    pub fn sticky_filters(&self) -> bool {
        self.search_and_filters && self.search_and_filters_sticky
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub theme: ThemeConfig,
}

impl SiteConfig {
    /// Load theme flags from a Jekyll theme data file plus environment.
    ///
    /// A missing file is not an error; the defaults apply.
    pub fn load(theme_file: &Path) -> Result<Self, ConfigError> {
        let theme: ThemeConfig = Self::figment(theme_file).extract()?;
        tracing::debug!(?theme, file = %theme_file.display(), "loaded theme flags");
        Ok(Self { theme })
    }

    fn figment(theme_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(ThemeConfig::default()))
            .merge(Yaml::file(theme_file))
            .merge(
                Env::prefixed("SITE_THEME_")
                    .lowercase(false)
                    .map(|key| camel_case(key.as_str()).into()),
            )
    }
}

/// `MEDIA_SCROLL` -> `mediaScroll`, matching the theme file's key style.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch.to_ascii_lowercase());
        }
    }
    out
}
