use std::fmt;

/// Opaque identifier for one image embedded in a document, usually a URL.
///
/// Equality is by value. Two documents may embed the same reference; a single
/// document may embed it more than once.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// True when the reference carries a scheme such as `https:`.
    ///
    /// Protocol-relative (`//host/path`) and path-only references are
    /// relative and need a base to be fetched.
    pub fn is_absolute(&self) -> bool {
        let Some((scheme, _)) = self.0.split_once(':') else {
            return false;
        };
        let mut chars = scheme.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }
}

impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageReference").field(&self.0).finish()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageReference {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for ImageReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
