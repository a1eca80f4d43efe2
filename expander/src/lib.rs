pub mod articles;
pub mod build;
pub mod cursor;
pub mod error;
pub mod parser;
mod resolver;
pub mod scope;
mod sections;
pub mod value;

pub use articles::ContentIndex;
pub use build::{BuildOptions, BuildReport, PageFailure, build};
pub use cursor::CursorTable;
pub use error::{ExpandError, Unresolved};
pub use parser::{DEFAULT_MAX_DEPTH, Expander};
pub use scope::Scope;
pub use value::Value;
