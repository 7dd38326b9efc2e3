use crate::error::{HpkError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn name_and_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^<>]*)(\s+)?<([^<> ]+)>$").expect("valid url regex")
    })
}

/// A package URL, either naked or in the `Name <url>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PkgUrl {
    input: String,
    name: Option<String>,
    url: String,
}

impl PkgUrl {
    /// Parse a URL string. Empty (after trimming) input is a precondition
    /// failure.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(HpkError::Precondition(
                "a package url must not be empty".to_string(),
            ));
        }

        let (name, url) = match name_and_url_pattern().captures(input) {
            Some(captures) => {
                let name = captures
                    .get(1)
                    .map(|m| m.as_str().trim())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);
                let url = captures.get(3).map_or(input, |m| m.as_str());
                (name, url.to_string())
            }
            None => (None, input.to_string()),
        };

        Ok(Self {
            input: input.to_string(),
            name,
            url,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for PkgUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.input)
    }
}
