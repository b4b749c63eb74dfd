//! Translation catalogs for alert captions.
//!
//! Catalogs are JSON documents with nested keys, looked up with dotted paths such as
//! `alerts.itemReceived`. Values may contain `{{name}}` placeholders that are replaced by
//! the interpolation variables given to [`Translator::translate`]. Values are not escaped:
//! captions carry markup.
//!
//! One file exists per language, named `<lang>.json`, either in a local directory or
//! below an HTTP base URL.

use std::{fmt, io};

use log::{debug, info, warn};
use serde_json::Value;
use tokio::fs;

use crate::utils::get_path;

/// Language used when the requested one is unsupported or incomplete.
const FALLBACK_LANGUAGE: &str = "en";

/// Maps a message key and interpolation variables to a localized string.
pub trait Translator: Send {
    /// Translates `key`, substituting `{{name}}` placeholders with `vars`.
    ///
    /// Returns the key itself when no catalog knows it.
    fn translate(&self, key: &str, vars: &[(&str, String)]) -> String;
}

/// Errors that can occur while loading a catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// A local catalog file could not be read
    Io(io::Error),
    /// A remote catalog could not be fetched
    Http(reqwest::Error),
    /// The catalog is not valid JSON
    Parse(serde_json::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "unable to read catalog: {}", e),
            CatalogError::Http(e) => write!(f, "unable to fetch catalog: {}", e),
            CatalogError::Parse(e) => write!(f, "invalid catalog: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

/// A loaded translation catalog with an optional fallback catalog.
pub struct Catalog {
    /// Language of the primary messages
    language: String,
    messages: Value,
    /// Messages of [`FALLBACK_LANGUAGE`], consulted for keys missing from `messages`
    fallback: Option<Value>,
}

impl Catalog {
    pub fn new(language: &str, messages: Value, fallback: Option<Value>) -> Self {
        Catalog {
            language: language.to_owned(),
            messages,
            fallback,
        }
    }

    /// Loads the catalog for `lang` from `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - Directory or `http(s)://` base URL holding `<lang>.json` files
    /// * `lang` - Requested language tag, e.g. `de-DE`. Only the language part is used.
    /// * `supported` - Languages that have a catalog
    ///
    /// The fallback catalog is loaded alongside a non-fallback language. If the requested
    /// language cannot be loaded, the fallback language is used on its own.
    ///
    /// # Errors
    ///
    /// Returns an error when the fallback catalog itself cannot be loaded.
    pub async fn load(
        source: &str,
        lang: Option<&str>,
        supported: &[String],
    ) -> Result<Self, CatalogError> {
        let language = Self::resolve_language(lang, supported);
        info!("loading {} catalog from {}", language, source);

        let fallback = Self::fetch(source, FALLBACK_LANGUAGE).await?;
        if language == FALLBACK_LANGUAGE {
            return Ok(Catalog::new(&language, fallback, None));
        }

        match Self::fetch(source, &language).await {
            Ok(messages) => Ok(Catalog::new(&language, messages, Some(fallback))),
            Err(e) => {
                warn!(
                    "failed to load {} catalog, using {}: {}",
                    language, FALLBACK_LANGUAGE, e
                );
                Ok(Catalog::new(FALLBACK_LANGUAGE, fallback, None))
            }
        }
    }

    /// Language of the primary messages.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Reduces a language tag to its language part and checks it is supported.
    fn resolve_language(lang: Option<&str>, supported: &[String]) -> String {
        let Some(lang) = lang else {
            return FALLBACK_LANGUAGE.to_owned();
        };

        let language = lang
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();

        if supported.iter().any(|s| s.eq_ignore_ascii_case(&language)) {
            language
        } else {
            debug!("language {} is not supported", lang);
            FALLBACK_LANGUAGE.to_owned()
        }
    }

    async fn fetch(source: &str, language: &str) -> Result<Value, CatalogError> {
        let file_name = format!("{}.json", language);

        if source.starts_with("http://") || source.starts_with("https://") {
            let url = format!("{}/{}", source.trim_end_matches('/'), file_name);
            debug!("request {}", url);
            return reqwest::get(&url)
                .await
                .and_then(|response| response.error_for_status())
                .map_err(CatalogError::Http)?
                .json()
                .await
                .map_err(CatalogError::Http);
        }

        let json = fs::read_to_string(get_path(source, &file_name))
            .await
            .map_err(CatalogError::Io)?;
        serde_json::from_str(&json).map_err(CatalogError::Parse)
    }

    fn lookup<'a>(messages: &'a Value, key: &str) -> Option<&'a str> {
        key.split('.')
            .try_fold(messages, |node, part| node.get(part))?
            .as_str()
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, vars: &[(&str, String)]) -> String {
        let template = Self::lookup(&self.messages, key)
            .or_else(|| {
                self.fallback
                    .as_ref()
                    .and_then(|fallback| Self::lookup(fallback, key))
            })
            .unwrap_or(key);

        interpolate(template, vars)
    }
}

/// Replaces every `{{name}}` placeholder of `template` in a single pass.
///
/// Substituted values are never scanned again. Unknown placeholders are kept as is.
fn interpolate(template: &str, vars: &[(&str, String)]) -> String {
    let mut text = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        text.push_str(&rest[..start]);
        rest = &rest[start..];
        let Some(len) = rest[2..].find("}}") else {
            break;
        };
        let end = 2 + len + 2;
        let name = rest[2..end - 2].trim();

        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => text.push_str(value),
            None => text.push_str(&rest[..end]),
        }
        rest = &rest[end..];
    }

    text.push_str(rest);
    text
}
