//! Call Key Module
//!
//! Derives a composite, hashable cache key from positional and keyword arguments.

use std::collections::HashSet;

use crate::error::{CacheError, Result};

// == Kwargs ==
/// Named arguments passed to a memoized function.
///
/// Order of insertion is irrelevant to the derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kwargs<W> {
    pairs: Vec<(String, W)>,
}

impl<W> Default for Kwargs<W> {
    fn default() -> Self {
        Self { pairs: Vec::new() }
    }
}

impl<W> Kwargs<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named argument.
    pub fn arg(mut self, name: impl Into<String>, value: W) -> Self {
        self.pairs.push((name.into(), value));
        self
    }

    /// Looks up an argument by name.
    pub fn get(&self, name: &str) -> Option<&W> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &W)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.pairs.len());
        for (name, _) in &self.pairs {
            if name.is_empty() {
                return Err(CacheError::InvalidArgument(
                    "keyword argument name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(CacheError::InvalidArgument(format!(
                    "got multiple values for keyword argument '{}'",
                    name
                )));
            }
        }
        Ok(())
    }
}

// == Call Key ==
/// Composite key for one call: positional arguments, then keyword arguments
/// in name order.
///
/// Keywords sit in their own field, so `f(1, 2)` and `f(a=1, b=2)` can never
/// produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey<A, W> {
    args: A,
    keywords: Option<Vec<(String, W)>>,
}

impl<A, W> CallKey<A, W> {
    /// Key for a call with positional arguments only.
    pub fn positional(args: A) -> Self {
        Self {
            args,
            keywords: None,
        }
    }

    /// The positional arguments.
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Keyword arguments sorted by name, if any were given.
    pub fn keywords(&self) -> Option<&[(String, W)]> {
        self.keywords.as_deref()
    }
}

// == Make Key ==
/// Builds the cache key for a call.
///
/// # Errors
/// Returns [`CacheError::InvalidArgument`] if a keyword name is empty or given twice.
pub fn make_key<A, W: Clone>(args: A, kwargs: &Kwargs<W>) -> Result<CallKey<A, W>> {
    kwargs.validate()?;
    if kwargs.is_empty() {
        return Ok(CallKey::positional(args));
    }

    let mut keywords = kwargs.pairs.clone();
    keywords.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(CallKey {
        args,
        keywords: Some(keywords),
    })
}
