//! Namespaces declared on the WordprocessingML parts this crate writes

/// WordprocessingML main namespace
pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Office document relationships namespace (`r:id` attributes)
pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Root declarations for a freshly created document, footnotes or settings part
pub fn wordml_namespaces() -> Vec<(String, String)> {
    [("xmlns:w", W), ("xmlns:r", R)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
