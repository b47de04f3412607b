//! # gocompile
//!
//! Front-end driver and semantic middle-end for a statically typed,
//! garbage-collected, Go-like systems language: symbol and package
//! management, a three-phase type checker, closure capture analysis,
//! bottom-up inlining, whole-package escape analysis, and closure
//! environment-record lowering.
//!
//! The lexer/parser and the SSA backend are external collaborators — this
//! crate owns everything between them. [`driver::Compiler`] is the single
//! entry point: it sequences every phase in the hard order its module doc
//! describes and hands back either a serialized object file or the
//! diagnostics that blocked one.
//!
//! ## Module map
//!
//! - [`ast`] — the node/func arena and tagged-variant `Op`/`Payload` shapes
//!   every later phase walks.
//! - [`symtab`] — packages, symbols, and block-scoped declaration stacks.
//! - [`types`] — the canonicalizing type table, including deferred width
//!   resolution for recursive types.
//! - [`universe`] — the predeclared identifiers every package starts with.
//! - [`importer`] — reading another package's object file and installing its
//!   exported symbols.
//! - [`typecheck`] — the three-phase (`xtop` A/B/C) type checker.
//! - [`closures`] — by-value vs. by-reference capture analysis.
//! - [`inline`] — eligibility and bottom-up call-site expansion.
//! - [`escape`] — the `NoEscape < EscapesThroughReturn < EscapesToHeap`
//!   dataflow lattice.
//! - [`closure_xform`] — rewriting escaping/by-reference closures into
//!   explicit environment records.
//! - [`scc`] — the shared Tarjan SCC utility `inline` and `escape` both
//!   build their bottom-up orders on.
//! - [`objfile`] — unix-ar archive and object-file header framing.
//! - [`export`] — the serializable export-data payload a package exposes to
//!   importers.
//! - [`diag`] — diagnostic batching, the per-line error cap, and `-h`
//!   halt-on-first-error.
//! - [`flags`] — hand-rolled CLI flag parsing.
//! - [`colors`] — ANSI painting for diagnostics, gated by `-color`/TTY
//!   detection.
//! - [`decls`] — block-scoped declaration contexts used while walking into
//!   nested scopes.
//! - [`driver`] — the phase sequencer described above.

pub mod ast;
pub mod closure_xform;
pub mod closures;
pub mod colors;
pub mod decls;
pub mod diag;
pub mod driver;
pub mod escape;
pub mod export;
pub mod flags;
pub mod importer;
pub mod inline;
pub mod objfile;
pub mod scc;
pub mod symtab;
pub mod typecheck;
pub mod types;
pub mod universe;
