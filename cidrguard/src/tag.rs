//! Block allocation tags.
//!
//! A block allocation is recorded as a single allocated address (the block's
//! network address) whose description is `"<cidr> - <description>"`. Every
//! backend stores this string verbatim, and reporting queries recover the
//! block from it.

use std::fmt;

/// Separator between the CIDR and the caller's description.
pub const SEPARATOR: &str = " - ";

/// A parsed block allocation tag.
///
/// # Examples
///
/// ```
/// use cidrguard::tag::BlockTag;
///
/// let tag = BlockTag::new("10.0.0.0/30", "web tier");
/// assert_eq!(tag.to_string(), "10.0.0.0/30 - web tier");
///
/// let parsed = BlockTag::parse("10.0.0.0/30 - web - blue").unwrap();
/// assert_eq!(parsed.cidr, "10.0.0.0/30");
/// assert_eq!(parsed.description, "web - blue");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTag {
    /// The allocated block in canonical form.
    pub cidr: String,
    /// The caller's description.
    pub description: String,
}

impl BlockTag {
    /// Creates a tag from its parts.
    pub fn new(cidr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            description: description.into(),
        }
    }

    /// Splits a stored description on the first separator.
    ///
    /// Returns `None` for plain single-address descriptions.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.split_once(SEPARATOR)
            .map(|(cidr, description)| Self::new(cidr, description))
    }

    /// Encodes the tag into its stored form.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.cidr, self.description)
    }
}
