//! Chain notation: tokenizer, sanitization and identifier synthesis

pub mod error;
pub mod notation;
pub mod sanitize;
pub mod tokenizer;

pub use error::{SyntaxError, SyntaxResult};
pub use notation::{Anchor, MapSide};
pub use sanitize::{identifier_fragment, sanitize, IdentifierRegistry};
pub use tokenizer::{tokenize, ChainToken, TokenizedChain};
