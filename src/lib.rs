//! Parsing, validation, editing, and traversal of assembly graphs in
//! the GFA format, versions GFA1 and GFA2.
//!
//! The record layer ([`gfa`], [`gfa2`], [`optfields`], [`fieldtype`])
//! models GFA lines with per-record positional-field schemas and
//! SAM-style tags. The [`graph`] module holds the mutable container
//! with its connectivity index and the editing and traversal
//! operations built on it; [`parser`] and [`writer`] translate
//! between text and records.

pub mod cigar;
pub mod error;
pub mod fieldtype;
pub mod gfa;
pub mod gfa2;
pub mod graph;
pub mod optfields;
pub mod parser;
pub mod sequence;
pub mod writer;
