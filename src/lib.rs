//! Planning-document pipeline: a product idea becomes a PRD, technical specification,
//! action plan, milestone specifications and go-to-market plan, one LLM completion per
//! template section, each written as a versioned markdown file.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod log;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod template;
pub mod ux;
