//! blog-auto-review-stack: declarative infrastructure for the blog auto-review pipeline.
//!
//! An hourly scheduler calls a feed-checking function; when it finds new posts it publishes to a
//! pub/sub topic, which triggers the review function. This crate packages both functions as
//! content-addressed archives, composes the resource graph around them and synthesizes it to
//! Terraform JSON for an external engine to apply.
//!
//! Entry points: [`stack::compose_stack`] for the graph, [`deploy::run_stack`] for the whole run.

pub mod archive;
pub mod cli;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod function;
pub mod graph;
pub mod load_config;
pub mod provisioner;
pub mod resource;
pub mod stack;
pub mod synth;

pub use cli::{run, Cli, Commands};
