use std::fmt;

use crate::config::ConfigError;

/// Locale
///
/// A language code drawn from the configured supported set (e.g. `id`, `en`).
/// Values are only handed out by a `LocaleSet`, so holding a `Locale` means
/// holding a supported one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    code: String,
}

impl Locale {
    /// The locale code as it appears in the first path segment.
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// LocaleSet
///
/// The ordered list of locales the storefront serves, plus the fallback used
/// whenever negotiation finds nothing better. The default is always a member.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    supported: Vec<Locale>,
    default: Locale,
}

impl Default for LocaleSet {
    /// Indonesian first, English second, Indonesian as fallback.
    fn default() -> Self {
        let id = Locale { code: "id".to_string() };
        let en = Locale { code: "en".to_string() };
        Self {
            supported: vec![id.clone(), en],
            default: id,
        }
    }
}

impl LocaleSet {
    /// new
    ///
    /// Builds a validated locale set. Codes must be non-empty and may not
    /// contain `/` (they become a path segment). Duplicates are dropped,
    /// keeping the first occurrence.
    pub fn new<I, S>(codes: I, default: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut supported: Vec<Locale> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim();
            if code.is_empty() || code.contains('/') {
                return Err(ConfigError::InvalidLocale(code.to_string()));
            }
            if supported.iter().all(|l| l.code != code) {
                supported.push(Locale {
                    code: code.to_string(),
                });
            }
        }

        if supported.is_empty() {
            return Err(ConfigError::NoLocales);
        }

        let default = supported
            .iter()
            .find(|l| l.code == default.trim())
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedDefault(default.to_string()))?;

        Ok(Self { supported, default })
    }

    pub fn supported(&self) -> &[Locale] {
        &self.supported
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    /// Exact, case-sensitive lookup of a path segment.
    pub fn get(&self, segment: &str) -> Option<&Locale> {
        self.supported.iter().find(|l| l.code == segment)
    }

    /// negotiate
    ///
    /// Best-fit match of an `Accept-Language` value against the supported set.
    ///
    /// Ranges are tried in descending quality order (header order breaks ties).
    /// Each range first tries an exact case-insensitive match, then a match on
    /// the primary language subtag, so `en-US` selects `en`. Anything that
    /// cannot be matched, including an absent or garbled header, yields the
    /// default locale.
    pub fn negotiate(&self, accept_language: Option<&str>) -> &Locale {
        let Some(header) = accept_language else {
            return &self.default;
        };

        for range in parse_accept_language(header) {
            if range.tag == "*" {
                continue;
            }

            if let Some(locale) = self
                .supported
                .iter()
                .find(|l| l.code.eq_ignore_ascii_case(range.tag))
            {
                return locale;
            }

            let primary = primary_subtag(range.tag);
            if let Some(locale) = self
                .supported
                .iter()
                .find(|l| primary_subtag(&l.code).eq_ignore_ascii_case(primary))
            {
                return locale;
            }
        }

        &self.default
    }
}

/// One entry of an `Accept-Language` header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageRange<'a> {
    pub tag: &'a str,
    pub quality: f32,
}

/// parse_accept_language
///
/// Parses a header value into ranges sorted by quality, highest first.
/// Malformed entries and entries with `q=0` are dropped rather than failing
/// the whole header.
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange<'_>> {
    let mut ranges: Vec<LanguageRange<'_>> = header.split(',').filter_map(parse_range).collect();
    // sort_by is stable, so equal qualities keep header order.
    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

fn parse_range(entry: &str) -> Option<LanguageRange<'_>> {
    let mut parts = entry.split(';');
    let tag = parts.next()?.trim();
    if !is_language_tag(tag) {
        return None;
    }

    let mut quality = 1.0_f32;
    for param in parts {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("q") {
            quality = value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|q| (0.0..=1.0).contains(q))?;
        }
    }

    (quality > 0.0).then_some(LanguageRange { tag, quality })
}

fn is_language_tag(tag: &str) -> bool {
    if tag == "*" {
        return true;
    }
    !tag.is_empty()
        && tag.split('-').all(|subtag| {
            (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}
