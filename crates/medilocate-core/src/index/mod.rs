//! Medicine-name autocomplete.

mod catalog;
mod trie;

pub use catalog::*;
pub use trie::*;
