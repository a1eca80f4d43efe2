pub mod error;
pub mod markdown;
pub mod source;
pub mod tag;
pub mod tree;

pub use error::{MarkupError, TagError};
pub use source::{Origin, SourceKind};
pub use tree::{Block, DirectiveKind, Document};
