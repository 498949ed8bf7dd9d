//! Subword tokenizer capability.
//!
//! The alignment codec and the metrics pipeline only need a narrow slice of
//! a tokenizer: subword splitting, id/token conversion, detokenization, and
//! assembly of padded model inputs with a special-token mask. [`Tokenizer`]
//! captures that slice; [`WordPieceTokenizer`] is a vocabulary-driven
//! implementation of it.
//!
//! # Example
//!
//! ```
//! use evaluar::tokenizer::{PaddingConfig, Tokenizer, TokenizerConfig, WordPieceTokenizer};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokenizer = WordPieceTokenizer::from_vocab(
//!         TokenizerConfig::wordpiece(),
//!         ["hello", "world", "##s"],
//!     )?;
//!
//!     let ids = tokenizer.encode("hello worlds")?;
//!     let input = tokenizer.prepare_for_model(&ids, None, &PaddingConfig::default().with_max_length(8))?;
//!     assert_eq!(input.content_len(), 3);
//!     assert_eq!(tokenizer.decode(&input.input_ids, true, true)?, "hello worlds");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

mod config;
mod error;
mod traits;
mod wordpiece;

pub use config::{PaddingConfig, SpecialTokens, TokenizerConfig, TruncationStrategy};
pub use error::{Result, TokenizerError};
pub use traits::{clean_up_tokenization, EncodedInput, SpecialIds, TokenId, Tokenizer};
pub use wordpiece::WordPieceTokenizer;
