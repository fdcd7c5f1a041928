//! **voxcode** - Text engine for voice-driven code editing
//!
//! Turns spoken phrases into code: number words become digits, naming styles
//! are applied, source is encoded for the translation model and decoded back,
//! and snippet templates are filled and spliced into the buffer as diffs.

/// Command-line interface with clap integration
pub mod cli;

/// Command handlers behind the `vox` subcommands
pub mod cli_ext {
    /// tokenize, decode, numbers, style and format
    pub mod text_cmd;

    /// Snippet resolution against a file or inline source
    pub mod resolve_cmd;
}

/// Shell completion generation
pub mod completion;

/// Text engine - pure transforms plus the model client and resolver
pub mod core {
    /// Half-open byte ranges and their ordering
    pub mod range;
    pub use range::Range;

    /// Error taxonomy shared by every entry point
    pub mod error;
    pub use error::{EngineError, LanguageError, RangeError, UnknownsError, VoxError};

    /// Whitespace classification and indentation probing
    pub mod whitespace;

    /// Layered edit descriptions over an immutable initial source
    pub mod diff;
    pub use diff::{Change, Diff};

    /// Identifier naming styles
    pub mod text_style;
    pub use text_style::TextStyle;

    /// Spoken numbers to digits and back
    pub mod numbers;

    /// Contraction expansion and restoration
    pub mod contractions;

    /// Escaping words that collide with model vocabulary
    pub mod escaper;

    /// Reserved `<%...%>` placeholders and slot substitution
    pub mod placeholder;

    /// Source lexing and the model token representation
    pub mod tokenizer;
    pub use tokenizer::{Token, TokenKind};

    /// Identifier runs and how they are spoken
    pub mod alpha_numeric;

    /// Out-of-vocabulary substitution
    pub mod unknowns;

    /// Per-language phrase tables
    pub mod conversion_map;
    pub use conversion_map::{ConversionMap, Language, conversion_map};

    /// Spoken phrase to code without the model
    pub mod formatted_text;
    pub use formatted_text::FormattedTextOptions;

    /// Model input assembly
    pub mod input;
    pub use input::{InputConverter, SlotContext};

    /// Translation model client and wire types
    pub mod engine;
    pub use engine::{CodeEngineClient, EngineOptions, ModelTransport};

    /// Request batching in front of the model client
    pub mod batch;
    pub use batch::BatchQueue;

    /// Snippet template resolution
    pub mod resolver;
    pub use resolver::{DiffWithMetadata, Resolver, SnippetRequest};
}

/// Infrastructure - configuration, lexicons, line indexing and logging
pub mod infra {
    /// Layered settings from voxcode.toml and VOXCODE_* variables
    pub mod config;
    pub use config::{Settings, init as config_init, load_settings};

    /// Auto-style lexicon files
    pub mod lexicon;
    pub use lexicon::{load_lexicon, load_lexicons};

    /// Newline index for offset to line lookups
    pub mod line_index;
    pub use line_index::LineIndex;

    /// Tracing subscriber setup
    pub mod logging;
}

// Strategic re-exports for library consumers
pub use cli::{AppContext, Cli, Commands};
pub use core::{
    BatchQueue, CodeEngineClient, Diff, FormattedTextOptions, Language, ModelTransport, Resolver, SnippetRequest,
    VoxError,
};
pub use infra::{Settings, load_settings};
