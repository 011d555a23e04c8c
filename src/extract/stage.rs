//! Extraction stages
//!
//! A stage is one token of an extraction spec. Each token is matched against
//! the stage grammars in [`STAGE_PRIORITY`] order and the first grammar that
//! accepts it decides the kind of [`Step`] produced.

use crate::CompileError;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;

/// The grammar a spec token can match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// `@name` - read an attribute
    Attribute,
    /// `/pattern/` - regex over the value or the markup
    Regex,
    /// `first()` - keep only the first node
    First,
    /// Anything else - a CSS selector
    Selector,
}

/// Order in which stage grammars are tried; the first match wins
pub const STAGE_PRIORITY: [StageKind; 4] = [
    StageKind::Attribute,
    StageKind::Regex,
    StageKind::First,
    StageKind::Selector,
];

impl StageKind {
    /// Returns the stage argument if `token` has the shape of this kind
    pub fn match_token(self, token: &str) -> Option<&str> {
        match self {
            Self::Attribute => token.strip_prefix('@').filter(|name| !name.is_empty()),
            Self::Regex => token
                .strip_prefix('/')
                .and_then(|rest| rest.strip_suffix('/'))
                .filter(|pattern| !pattern.is_empty()),
            Self::First => (token == "first()").then_some(token),
            Self::Selector => (!token.is_empty()).then_some(token),
        }
    }

    fn build(self, arg: &str, token: &str) -> Result<Step, CompileError> {
        match self {
            Self::Attribute => Ok(Step::Attribute(arg.to_string())),
            Self::Regex => Regex::new(arg)
                .map(Step::Regex)
                .map_err(|e| CompileError::InvalidRegex {
                    token: token.to_string(),
                    message: e.to_string(),
                }),
            Self::First => Ok(Step::First),
            Self::Selector => Selector::parse(arg)
                .map(|selector| Step::Select {
                    source: arg.to_string(),
                    selector,
                })
                .map_err(|e| CompileError::InvalidSelector {
                    token: token.to_string(),
                    message: e.to_string(),
                }),
        }
    }
}

/// How the current node-set relates to the document
///
/// A chain run from the document starts in `Document` scope: its nodes are
/// the document root itself, so a selector may match the root element and
/// markup reads include the root tag. The first selector step moves the
/// chain into `Nodes` scope, where selectors only see descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Nodes,
}

/// A single compiled extraction step
///
/// Every step maps `(value, nodes)` to a new `(value, nodes)` pair and has no
/// other effect.
#[derive(Debug, Clone)]
pub enum Step {
    Attribute(String),
    Regex(Regex),
    First,
    Select { source: String, selector: Selector },
}

impl Step {
    /// Returns the kind of grammar this step was compiled from
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Attribute(_) => StageKind::Attribute,
            Self::Regex(_) => StageKind::Regex,
            Self::First => StageKind::First,
            Self::Select { .. } => StageKind::Selector,
        }
    }

    /// Applies the step to the accumulated value and the current node-set
    pub fn apply<'a>(
        &self,
        value: String,
        nodes: Vec<ElementRef<'a>>,
    ) -> (String, Vec<ElementRef<'a>>) {
        self.apply_in(Scope::Nodes, value, nodes)
    }

    /// Applies the step with the node-set interpreted in `scope`
    pub fn apply_in<'a>(
        &self,
        scope: Scope,
        value: String,
        nodes: Vec<ElementRef<'a>>,
    ) -> (String, Vec<ElementRef<'a>>) {
        match self {
            Self::Attribute(name) => {
                let attr = nodes
                    .first()
                    .and_then(|node| node.value().attr(name))
                    .unwrap_or_default()
                    .to_string();
                (attr, nodes)
            }

            Self::Regex(re) => {
                let haystack = if value.is_empty() {
                    nodes
                        .first()
                        .map(|node| match scope {
                            Scope::Document => node.html(),
                            Scope::Nodes => node.inner_html(),
                        })
                        .unwrap_or_default()
                } else {
                    value
                };
                let matched = match re.captures(&haystack) {
                    Some(caps) => caps
                        .get(1)
                        .map(|m| m.as_str())
                        .filter(|group| !group.is_empty())
                        .or_else(|| caps.get(0).map(|m| m.as_str()))
                        .unwrap_or_default()
                        .to_string(),
                    None => String::new(),
                };
                (matched, nodes)
            }

            Self::First => {
                let mut nodes = nodes;
                nodes.truncate(1);
                (value, nodes)
            }

            Self::Select { selector, .. } => {
                // Nested matches can be reached from several parents
                let mut seen = HashSet::new();
                let matched: Vec<ElementRef<'a>> = nodes
                    .iter()
                    .flat_map(|node| {
                        let own = (scope == Scope::Document && selector.matches(node))
                            .then_some(*node);
                        own.into_iter().chain(node.select(selector))
                    })
                    .filter(|element| seen.insert(element.id()))
                    .collect();

                let value = if value.is_empty() {
                    matched
                        .iter()
                        .flat_map(|element| element.text())
                        .collect::<String>()
                } else {
                    value
                };
                (value, matched)
            }
        }
    }
}

/// Compiles one spec token into a step
///
/// Surrounding whitespace is ignored. An empty token is rejected.
pub fn compile_stage(token: &str) -> Result<Step, CompileError> {
    let token = token.trim();

    for kind in STAGE_PRIORITY {
        if let Some(arg) = kind.match_token(token) {
            return kind.build(arg, token);
        }
    }

    Err(CompileError::EmptyStage {
        spec: token.to_string(),
    })
}
