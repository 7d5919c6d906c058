//! Per-file stub tree construction and caching.

use crate::error::Result;
use crate::registry::SerializerRegistry;
use crate::tree::build::{DefaultStubBuilder, LightStubBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use stubscope_api::models::content::FileContent;
use stubscope_api::models::ids::FileType;
use stubscope_api::models::stub::StubTree;
use stubscope_plugin::{BinaryStubCaps, LanguageStubCaps};

/// Selects the right builder per file type and memoizes the result on the
/// content object.
pub struct StubTreeFactory {
    registry: Arc<SerializerRegistry>,
    lang_caps: HashMap<FileType, LanguageStubCaps>,
    bin_caps: HashMap<FileType, BinaryStubCaps>,
}

impl StubTreeFactory {
    pub fn new(
        registry: Arc<SerializerRegistry>,
        lang_caps: HashMap<FileType, LanguageStubCaps>,
        bin_caps: HashMap<FileType, BinaryStubCaps>,
    ) -> Self {
        Self {
            registry,
            lang_caps,
            bin_caps,
        }
    }

    /// `None` means the file is not stub-indexable; callers treat it as
    /// "nothing to index", not an error.
    ///
    /// Computed at most once per `FileContent` instance: concurrent callers
    /// block on the content's memo cell and all observe the first result.
    pub fn stub_tree(&self, content: &FileContent) -> Result<Option<Arc<StubTree>>> {
        content
            .stub_memo()
            .get_or_try_init(|| self.build(content))
            .cloned()
    }

    pub fn is_stub_indexable(&self, file_type: &FileType) -> bool {
        self.lang_caps.contains_key(file_type) || self.bin_caps.contains_key(file_type)
    }

    fn build(&self, content: &FileContent) -> Result<Option<Arc<StubTree>>> {
        // Binary stub builders bypass the syntax tree entirely.
        if let Some(bin) = self.bin_caps.get(&content.file_type) {
            let tree = bin.cap.build(content, self.registry.as_ref())?;
            return Ok(tree.filter(|t| !t.is_empty()).map(Arc::new));
        }

        let Some(lang) = self.lang_caps.get(&content.file_type) else {
            return Ok(None);
        };
        let Some(text) = content.as_text() else {
            return Ok(None);
        };

        // Prefer the flyweight parse when the language offers one;
        // multi-root files go through the full view parse.
        if let Some(light) = lang.cap.parse_light(text) {
            let tree = LightStubBuilder::build(lang.cap.as_ref(), &light, text, &self.registry);
            return Ok((!tree.is_empty()).then(|| Arc::new(tree)));
        }

        let views = lang.cap.parse_views(text)?;
        let primary =
            DefaultStubBuilder::build(lang.cap.as_ref(), &views.primary, text, &self.registry);
        if primary.is_empty() {
            // The stub binding root is not stub-aware; secondary roots alone
            // cannot be addressed, so the file yields nothing.
            return Ok(None);
        }

        let mut trees = vec![primary];
        for secondary in &views.secondary {
            trees.push(DefaultStubBuilder::build(
                lang.cap.as_ref(),
                secondary,
                text,
                &self.registry,
            ));
        }
        Ok(Some(Arc::new(StubTree::merge(trees))))
    }
}
