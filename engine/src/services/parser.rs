//! Parser facade (component B) — a *consumed* interface. spec.md §1 is
//! explicit that raw AST parsing is out of scope for this core ("the core
//! consumes parsed structures"); this module defines the trait contract
//! every analyzer programs against (spec.md §6) plus the handful of typed
//! views analyzers actually read.
//!
//! No upstream file grounds this directly — the toolkit this crate
//! draws from bundles its own tree-sitter-backed parsers into the
//! analyzers themselves, which is exactly the coupling spec.md asks this
//! engine to avoid. The trait shape follows this codebase's general
//! "service trait + typed DTO" convention (e.g. `VcsReader`,
//! `ContentSource`).

use crate::error::EngineResult;
use crate::models::Language;

/// A function definition as seen by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionView {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Opaque handle into the parse tree; analyzers that need the body
    /// text re-slice the source using `start_line`/`end_line`.
    pub body_handle: usize,
}

/// A class/struct/interface definition as seen by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassView {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Raw parent-class text as written in source (e.g. `"Base, Mixin"`);
    /// resolution into canonical names is the cohesion analyzer's job.
    pub parents_text: Vec<String>,
}

/// The kind of identifier reference collected by `identifiers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Read,
    Write,
    FieldAccess,
    TypeReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierView {
    pub name: String,
    pub kind: IdentifierKind,
    pub line: usize,
}

/// A call expression: the textual callee name (not yet resolved to a
/// node id — resolution is the graph/dead-code analyzers' job) and the
/// enclosing function, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallView {
    pub callee_name: String,
    pub line: usize,
    pub enclosing_function: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportView {
    pub resolved_path: String,
    pub line: usize,
}

/// The result of parsing one file: the typed selectors every analyzer
/// reads, plus the raw source for fallback tokenization (duplicate
/// detector, complexity analyzer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub language: Language,
    pub source: Vec<u8>,
    pub functions: Vec<FunctionView>,
    pub classes: Vec<ClassView>,
    pub identifiers: Vec<IdentifierView>,
    pub calls: Vec<CallView>,
    pub imports: Vec<ImportView>,
}

/// The parser facade contract (spec.md §6). Each worker owns an
/// independent handle (spec.md §5: "no shared mutable parser").
pub trait ParserFacade: Send + Sync {
    fn parse(&self, bytes: &[u8], language: Language, path: &str) -> EngineResult<ParseResult>;
}

/// A facade that returns an empty `ParseResult` for any unknown-language
/// file and otherwise must be backed by a real parser; used in tests
/// where only the raw-byte token pipeline (duplicate detection) matters.
#[derive(Default)]
pub struct NullParser;

impl ParserFacade for NullParser {
    fn parse(&self, bytes: &[u8], language: Language, _path: &str) -> EngineResult<ParseResult> {
        Ok(ParseResult {
            language,
            source: bytes.to_vec(),
            functions: Vec::new(),
            classes: Vec::new(),
            identifiers: Vec::new(),
            calls: Vec::new(),
            imports: Vec::new(),
        })
    }
}
