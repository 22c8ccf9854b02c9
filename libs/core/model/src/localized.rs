use std::collections::BTreeMap;

/// Text keyed by locale code, stored as a JSON object
pub type LocalizedText = BTreeMap<String, String>;

/// Locale keys of `text` that are not in `supported`, in key order
pub fn unsupported_locales(text: &LocalizedText, supported: &[String]) -> Vec<String> {
    text.keys()
        .filter(|locale| !supported.iter().any(|s| s == *locale))
        .cloned()
        .collect()
}
