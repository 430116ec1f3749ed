/// Compose source round-trip: parse source into a node tree, emit source
/// from designer blocks, and splice targeted edits back into source text.
pub mod block;
pub mod document;
pub mod emitter;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod synchronizer;

pub use block::{Block, BlockTree, BlockType, LayoutSize, Position};
pub use document::SourceDocument;
pub use emitter::{validate_code, CodeEmitter, GeneratedCode, GenerationConfig, ThemeConfig, ValidationResult};
pub use model::{
    ComponentType, ComposableFunction, ComposeNode, ModifierCall, ModifierChain, ParsedComposeFile,
    PropertyValue, SourceRange,
};
pub use parser::{parse_component, parse_file, ComposeParser};
pub use synchronizer::{CodeSynchronizer, SyncError, SyncResult};
