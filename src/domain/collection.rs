/// Canonical description of one archive collection.
///
/// Everything except `identifier` and `source_url` is optional; absent
/// fields are simply left out of generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionMetadata {
    pub identifier: String,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub year: Option<String>,
    /// who recorded the show (`creator`, falling back to the taper)
    pub recording_credit: Option<String>,
    pub taper: Option<String>,
    pub transfer_credit: Option<String>,
    pub lineage: Option<String>,
    pub topics: Vec<String>,
    pub collection: Option<String>,
    /// full description with markup removed
    pub description: Option<String>,
    /// `https://archive.org/details/<identifier>`, byte-identical across runs
    pub source_url: String,
}

impl CollectionMetadata {
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let source_url = crate::links::details_url(&identifier);
        Self {
            identifier,
            source_url,
            ..Default::default()
        }
    }
}
