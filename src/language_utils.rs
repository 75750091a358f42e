use anyhow::{Result, anyhow};
use isolang::Language;
use std::fmt;
use std::str::FromStr;

/// Language utilities for ISO language code handling
///
/// This module resolves ISO 639-1 (2-letter) and ISO 639-2/639-3 (3-letter)
/// codes into `isolang::Language` values, reads Matroska track language tags,
/// and parses the `top-bottom` language pairs used for merging.

/// Map an ISO 639-2/B code to its ISO 639-2/T equivalent
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    let part2t = match code {
        "fre" => "fra", // French
        "ger" => "deu", // German
        "dut" => "nld", // Dutch
        "gre" => "ell", // Greek
        "chi" => "zho", // Chinese
        "cze" => "ces", // Czech
        "ice" => "isl", // Icelandic
        "alb" => "sqi", // Albanian
        "arm" => "hye", // Armenian
        "baq" => "eus", // Basque
        "bur" => "mya", // Burmese
        "per" => "fas", // Persian
        "geo" => "kat", // Georgian
        "may" => "msa", // Malay
        "mac" => "mkd", // Macedonian
        "rum" => "ron", // Romanian
        "slo" => "slk", // Slovak
        "wel" => "cym", // Welsh
        "tib" => "bod", // Tibetan
        _ => return None,
    };
    Some(part2t)
}

/// Resolve a 2- or 3-letter code, returning `None` when it is unknown
pub fn lookup_language(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(&normalized_code)
            .or_else(|| part2b_to_part2t(&normalized_code).and_then(Language::from_639_3)),
        _ => None,
    }
}

/// Parse a language code (ISO 639-1, 639-3/639-2T or 639-2B)
pub fn parse_language(code: &str) -> Result<Language> {
    lookup_language(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Resolve a Matroska track language.
///
/// The BCP 47 tag wins when its primary subtag is known, otherwise the legacy
/// ISO 639-2 tag is used. `und` (undetermined) resolves to `None`.
pub fn language_from_track_tags(ietf: Option<&str>, legacy: Option<&str>) -> Option<Language> {
    let from_ietf = ietf
        .and_then(|tag| tag.split(['-', '_']).next())
        .filter(|primary| !primary.eq_ignore_ascii_case("und"))
        .and_then(lookup_language);

    from_ietf.or_else(|| {
        legacy
            .filter(|code| !code.trim().eq_ignore_ascii_case("und"))
            .and_then(lookup_language)
    })
}

/// ISO 639-1 code when one exists, otherwise ISO 639-3
pub fn short_code(language: Language) -> String {
    language
        .to_639_1()
        .unwrap_or_else(|| language.to_639_3())
        .to_string()
}

/// Two languages merged into one file, `top` shown above `bottom`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair {
    pub top: Language,
    pub bottom: Language,
}

impl LanguagePair {
    pub fn new(top: Language, bottom: Language) -> Self {
        Self { top, bottom }
    }

    /// Suffix used in merged file names, e.g. `ru_fr`
    pub fn file_suffix(&self) -> String {
        format!("{}_{}", short_code(self.top), short_code(self.bottom))
    }

    /// Database language value of a merge result, e.g. `rus,fra`
    pub fn storage_code(&self) -> String {
        format!("{},{}", self.top.to_639_3(), self.bottom.to_639_3())
    }
}

impl FromStr for LanguagePair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('-').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(anyhow!(
                "Invalid language pair '{}': expected two codes such as 'ru-fr'",
                s
            ));
        }

        let top = parse_language(parts[0])?;
        let bottom = parse_language(parts[1])?;
        Ok(Self { top, bottom })
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", short_code(self.top), short_code(self.bottom))
    }
}

/// Parse a comma-separated pair list such as `ru-fr,ru-en`.
///
/// Empty entries are ignored and duplicates are kept once.
pub fn parse_language_pairs(value: &str) -> Result<Vec<LanguagePair>> {
    let mut pairs: Vec<LanguagePair> = Vec::new();

    for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let pair: LanguagePair = item.parse()?;
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    Ok(pairs)
}

/// Parse a comma-separated language list such as `en,ru,fr`
pub fn parse_language_list(value: &str) -> Result<Vec<Language>> {
    let mut languages: Vec<Language> = Vec::new();

    for code in value.split(',').map(str::trim).filter(|code| !code.is_empty()) {
        let language = parse_language(code)?;
        if !languages.contains(&language) {
            languages.push(language);
        }
    }

    Ok(languages)
}
