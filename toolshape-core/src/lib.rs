// toolshape-core/src/lib.rs

//! Structured records from developer-tool output.
//!
//! Each supported tool has a converter ([`parsers::ToolParser`]) that turns
//! the captured stdout/stderr/exit code of one run into a typed Result with
//! derived counts and a `success` flag. [`compact::shape`] then picks the
//! full record or a smaller projection, whichever serves the caller better,
//! and every Result can describe itself in one line of text.
//!
//! ```
//! use toolshape_core::parsers::{compiler::TscParser, RawOutput, ToolParser};
//!
//! let raw = RawOutput::new(
//!     "src/index.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.\n",
//!     "",
//!     2,
//! );
//! let result = TscParser.parse(&raw).unwrap();
//! assert_eq!(result.errors, 1);
//! assert_eq!(result.diagnostics[0].code.as_deref(), Some("2322"));
//! ```

pub mod assemble;
pub mod compact;
pub mod config;
pub mod errors;
pub mod guard;
pub mod parsers;
pub mod scoring;
pub mod tokenize;

pub mod models {
    pub mod audit;
    pub mod checks;
    pub mod diagnostic;
    pub mod meta;
    pub mod tables;
    pub mod testing;
    pub mod vcs;
}

pub use compact::{shape, Compact, ShapeKind, Shaped};
pub use config::{OutputFormat, ToolshapeConfig};
pub use errors::{ConfigError, CountMismatch, ParseError};
pub use guard::{guard, guard_all};
pub use parsers::{parse_any, ParseOptions, RawOutput, Rendered, ToolKind, ToolParser};
pub use scoring::{classify, score_vector, severity_for, Scored, VulnSeverity};
