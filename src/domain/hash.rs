use blake3::Hash;

/// Short stable fingerprint of a string.
///
/// Used to keep derived names distinct when two inputs collapse
/// to the same sanitized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(pub Hash);

impl Fingerprint {
    pub fn of(value: &str) -> Self {
        Self(blake3::hash(value.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// first 8 hex digits
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::Fingerprint;

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        assert_eq!(Fingerprint::of("gd77-05-08"), Fingerprint::of("gd77-05-08"));
        assert_ne!(
            Fingerprint::of("gd77-05-08").short(),
            Fingerprint::of("gd77-05-09").short()
        );
        assert_eq!(Fingerprint::of("x").short().len(), 8);
    }
}
