use stubscope_api::models::ids::IndexId;

/// Receives key occurrences while a stub tree is walked for index
/// derivation. The core implementation attributes each occurrence to the
/// stub currently being visited.
pub trait IndexSink {
    fn occurrence(&mut self, index: &IndexId, key: &str);
}
