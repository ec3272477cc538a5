//! Bucket listing line format.

/// Minimum number of tab-separated fields in a well-formed listing line.
pub const LISTING_MIN_FIELDS: usize = 3;

/// One object from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// The object key.
    pub key: String,
    /// The object size in bytes.
    pub size: u64,
}

impl ListingEntry {
    /// Creates a new listing entry.
    #[must_use]
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Parses one listing line of the form `key\tsize\t...`.
    ///
    /// Returns `None` for lines with fewer than [`LISTING_MIN_FIELDS`]
    /// fields. A size that is not a base-10 integer is read as `0`.
    ///
    /// # Example
    ///
    /// ```
    /// use qdown_types::ListingEntry;
    ///
    /// let entry = ListingEntry::parse("a/b.mp4\t1024\tFhash").unwrap();
    /// assert_eq!(entry.key, "a/b.mp4");
    /// assert_eq!(entry.size, 1024);
    /// assert!(ListingEntry::parse("a/b.mp4\t1024").is_none());
    /// ```
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut fields = line.split('\t');
        let key = fields.next()?;
        let size = fields.next()?;
        fields.next()?;
        Some(Self::new(key, size.parse().unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let entry =
            ListingEntry::parse("demo/video.mp4\t52428800\tFhash\t14000000000000000\tvideo/mp4\t")
                .unwrap();
        assert_eq!(entry, ListingEntry::new("demo/video.mp4", 52_428_800));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let entry = ListingEntry::parse("  a/c.txt\t50\t...\r\n").unwrap();
        assert_eq!(entry.key, "a/c.txt");
        assert_eq!(entry.size, 50);
    }

    #[test]
    fn test_parse_too_few_fields() {
        assert!(ListingEntry::parse("").is_none());
        assert!(ListingEntry::parse("only-a-key").is_none());
        assert!(ListingEntry::parse("key\t10").is_none());
    }

    #[test]
    fn test_parse_bad_size_reads_zero() {
        let entry = ListingEntry::parse("key\tNaN\thash").unwrap();
        assert_eq!(entry.size, 0);
    }
}
