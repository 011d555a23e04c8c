//! Extraction pipeline
//!
//! This module compiles extraction specs and runs them against parsed
//! documents:
//! - `stage`: the stage grammars (`@attr`, `/regex/`, `first()`, CSS selector)
//! - `chain`: compiled chains of stages and their execution
//!
//! # Example
//!
//! ```
//! use endpoint_scraper::extract::compile;
//! use scraper::Html;
//!
//! let chain = compile("span.count | /(\\d+)/").unwrap();
//! let html = Html::parse_document(r#"<span class="count">42 items</span>"#);
//! assert_eq!(chain.execute_on(html.root_element()), "42");
//! ```

mod chain;
mod stage;

pub use chain::{compile, Chain, STAGE_DELIMITER};
pub use stage::{compile_stage, Scope, StageKind, Step, STAGE_PRIORITY};
