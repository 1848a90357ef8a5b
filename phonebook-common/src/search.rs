//! Name search
//!
//! A term matches a name when it occurs case-insensitively and starts at a
//! word boundary: at the beginning of the name or right after a non-word
//! character. "ann" finds "Ann Lee" and "Susan Ann" but not "Joanne".

use regex::{Regex, RegexBuilder};

use crate::{Contact, Error, Result};

/// Compiled matcher for one search term
#[derive(Debug, Clone)]
pub struct NameMatcher {
    pattern: Option<Regex>,
}

impl NameMatcher {
    /// Build a matcher; an absent or empty term matches every name
    pub fn new(term: Option<&str>) -> Result<Self> {
        let pattern = match term.filter(|term| !term.is_empty()) {
            Some(term) => Some(
                RegexBuilder::new(&format!(r"\b{}", regex::escape(term)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::BadInput(format!("Invalid search term: {}", e)))?,
            ),
            None => None,
        };

        Ok(Self { pattern })
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(name),
            None => true,
        }
    }

    /// Keep the contacts whose name matches
    pub fn filter(&self, contacts: impl IntoIterator<Item = Contact>) -> Vec<Contact> {
        contacts
            .into_iter()
            .filter(|contact| self.matches(&contact.name))
            .collect()
    }
}
