//! Core compatibility, decoding and constraint engine for the variant configurator.
//!
//! This crate owns the variant DAG: node storage backed by a closure table, the
//! options resolver, the type-code decoder, the constraint engine and the admin
//! mutators that keep closure-table invariants intact. It knows nothing about
//! HTTP, JWTs or blob storage — those are the `server` crate's job.
#[macro_use]
extern crate tracing;

pub mod cnf;
pub mod err;
pub mod model;
pub mod length_spec;
pub mod merge;
pub mod normalize;
pub mod selection;

pub mod store;

pub mod path;
pub mod compat;
pub mod decode;
pub mod constraint_engine;
pub mod group;
pub mod pattern_filter;
pub mod deepcopy;
pub mod successor_resolve;
pub mod label_parse;
pub mod import;
pub mod export;

pub mod admin;

pub use err::Error;
pub use store::Store;
