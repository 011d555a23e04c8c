use crate::extract::stage::{compile_stage, Scope, Step};
use crate::CompileError;
use scraper::{ElementRef, Html};
use serde::{Serialize, Serializer};

/// Separator between stages in a spec string
pub const STAGE_DELIMITER: &str = " | ";

/// An ordered, compiled list of extraction steps
///
/// Chains are compiled once and never re-parse their source. They hold no
/// mutable state and can be shared between concurrent executions.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    source: String,
    steps: Vec<Step>,
}

impl Chain {
    /// Compiles a chain from already separated stage tokens
    ///
    /// Tokens are not split any further. Compilation stops at the first
    /// token that fails.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sources = Vec::new();
        let mut steps = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            steps.push(compile_stage(token)?);
            sources.push(token.trim().to_string());
        }

        Ok(Self {
            source: sources.join(STAGE_DELIMITER),
            steps,
        })
    }

    /// The spec text this chain was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled steps, in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the chain against a starting node-set and returns the final value
    pub fn execute<'a>(&self, start: Vec<ElementRef<'a>>) -> String {
        let (value, _) = self
            .steps
            .iter()
            .fold((String::new(), start), |(value, nodes), step| {
                step.apply(value, nodes)
            });
        value
    }

    /// Runs the chain with a single node as the starting node-set
    pub fn execute_on(&self, node: ElementRef<'_>) -> String {
        self.execute(vec![node])
    }

    /// Runs the chain against a whole document
    ///
    /// Until the first selector step the node-set is the document root, so
    /// `html | @lang` reads the root element and a leading regex sees the
    /// full markup including the `<html>` tag.
    pub fn execute_document(&self, document: &Html) -> String {
        let mut scope = Scope::Document;
        let mut value = String::new();
        let mut nodes = vec![document.root_element()];

        for step in &self.steps {
            (value, nodes) = step.apply_in(scope, value, nodes);
            if let Step::Select { .. } = step {
                scope = Scope::Nodes;
            }
        }

        value
    }
}

impl Serialize for Chain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Compiles a spec string such as `"a[href] | @href"` into a chain
///
/// # Example
///
/// ```
/// use endpoint_scraper::extract::compile;
/// use scraper::Html;
///
/// let chain = compile("a[href] | @href").unwrap();
/// let html = Html::parse_document(r#"<a href="/next">Next</a>"#);
/// assert_eq!(chain.execute_on(html.root_element()), "/next");
/// ```
pub fn compile(spec: &str) -> Result<Chain, CompileError> {
    Chain::from_tokens(spec.split(STAGE_DELIMITER))
}
