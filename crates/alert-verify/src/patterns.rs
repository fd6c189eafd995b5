use regex::Regex;

/// Patterns which a notification body must contain. Each pattern is a
/// regular expression which may match anywhere in the body, and a body
/// matches only if every pattern does.
#[derive(Debug, Clone)]
pub struct Patterns(Vec<Regex>);

impl Patterns {
    pub fn new<I, S>(patterns: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(patterns))
    }

    pub fn matches_all(&self, body: &str) -> bool {
        self.0.iter().all(|re| re.is_match(body))
    }

    /// The first pattern which doesn't match the body.
    pub fn first_mismatch(&self, body: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|re| !re.is_match(body))
            .map(Regex::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
