/// A source snapshot together with the tree parsed from it
///
/// Synchronizer edits take the document by value, so node offsets from one
/// snapshot can never be applied to the text produced by an edit. Parse the
/// result again (`SyncResult::into_document`) before the next edit.
use crate::designer::model::{ComposableFunction, ParsedComposeFile};
use crate::designer::parser::parse_file;

#[derive(Debug, Clone)]
pub struct SourceDocument {
    source: String,
    parsed: ParsedComposeFile,
}

impl SourceDocument {
    pub fn parse(source: impl Into<String>, path: &str) -> Self {
        let source = source.into();
        let parsed = parse_file(&source, path);
        SourceDocument { source, parsed }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &str {
        &self.parsed.path
    }

    pub fn file(&self) -> &ParsedComposeFile {
        &self.parsed
    }

    pub fn function(&self, name: &str) -> Option<&ComposableFunction> {
        self.parsed.function(name)
    }

    pub fn into_source(self) -> String {
        self.source
    }
}
