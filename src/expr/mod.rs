//! Expression layer
//!
//! - `types`: type prefixes and casting
//! - `token`: lexing a schema body into path / call / literal tokens
//! - `interpolate`: `@{...}@` substitution inside literal text
//! - `eval`: resolving a schema string against a context document

mod eval;
pub mod interpolate;
pub mod token;
mod types;

pub use eval::Evaluator;
pub use token::{Token, Tokenizer};
pub use types::ValueType;
