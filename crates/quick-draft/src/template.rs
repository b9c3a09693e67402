//! Template Cache
//!
//! Mustache-flavoured templates compiled lazily and memoized per id:
//! - `<# if data.field #> … <# else #> … <# end #>` evaluation blocks
//! - `{{{ data.field }}}` raw interpolation
//! - `{{ data.field }}` HTML-escaped interpolation
//!
//! A template id resolves to its source through a [`TemplateSource`]. The
//! source is compiled on the first render and the result reused afterwards.

use regex::Regex;
use serde_json::Value;
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;

use crate::draft_list::{DRAFT_ITEM_TEMPLATE, DRAFT_ITEM_TEMPLATE_ID};
use crate::error::TemplateError;

/// Where template markup comes from.
pub trait TemplateSource {
    fn template_source(&self, id: &str) -> Option<String>;
}

/// In-memory sources, preloaded with the widget's own templates.
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    sources: HashMap<String, String>,
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::empty().with(DRAFT_ITEM_TEMPLATE_ID, DRAFT_ITEM_TEMPLATE)
    }
}

impl BuiltinTemplates {
    pub fn empty() -> Self {
        Self { sources: HashMap::new() }
    }

    pub fn with(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.insert(id.into(), source.into());
        self
    }
}

impl TemplateSource for BuiltinTemplates {
    fn template_source(&self, id: &str) -> Option<String> {
        self.sources.get(id).cloned()
    }
}

/// Memoizing template lookup. Cloning shares the memo table.
#[derive(Clone)]
pub struct TemplateCache {
    source: Rc<dyn TemplateSource>,
    templates: Rc<RefCell<HashMap<String, Rc<Template>>>>,
    compilations: Rc<Cell<usize>>,
}

impl TemplateCache {
    pub fn new(source: Rc<dyn TemplateSource>) -> Self {
        Self {
            source,
            templates: Rc::new(RefCell::new(HashMap::new())),
            compilations: Rc::new(Cell::new(0)),
        }
    }

    /// The render function for `id`. Repeated lookups return the same `Rc`.
    pub fn get_template(&self, id: &str) -> Rc<Template> {
        self.templates
            .borrow_mut()
            .entry(id.to_string())
            .or_insert_with(|| {
                Rc::new(Template {
                    id: id.to_string(),
                    source: self.source.clone(),
                    compiled: OnceCell::new(),
                    compilations: self.compilations.clone(),
                })
            })
            .clone()
    }

    /// Number of compile passes run across all templates of this cache
    pub fn compilations(&self) -> usize {
        self.compilations.get()
    }
}

pub struct Template {
    id: String,
    source: Rc<dyn TemplateSource>,
    compiled: OnceCell<Result<Vec<Node>, TemplateError>>,
    compilations: Rc<Cell<usize>>,
}

impl Template {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let nodes = self
            .compiled
            .get_or_init(|| {
                self.compilations.set(self.compilations.get() + 1);
                log::debug!("[template] compiling `{}`", self.id);
                let source = self
                    .source
                    .template_source(&self.id)
                    .ok_or_else(|| TemplateError::NotFound(self.id.clone()))?;
                compile(&source)
            })
            .as_ref()
            .map_err(Clone::clone)?;

        let mut out = String::new();
        render_nodes(nodes, data, &mut out);
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Raw(Vec<String>),
    Escaped(Vec<String>),
    If {
        path: Vec<String>,
        negate: bool,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\{\{\{(.+?)\}\}\}|<#(.+?)#>|\{\{([^}]+?)\}\}").expect("static pattern")
    })
}

struct Frame {
    condition: Option<(Vec<String>, bool)>,
    then: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

impl Frame {
    fn root() -> Self {
        Frame { condition: None, then: Vec::new(), otherwise: None }
    }

    fn nodes(&mut self) -> &mut Vec<Node> {
        match self.otherwise.as_mut() {
            Some(otherwise) => otherwise,
            None => &mut self.then,
        }
    }
}

fn compile(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut stack = vec![Frame::root()];
    let mut cursor = 0;

    for caps in tag_pattern().captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut stack, &source[cursor..whole.start()], cursor)?;
        cursor = whole.end();

        if let Some(raw) = caps.get(1) {
            current(&mut stack).push(Node::Raw(parse_path(raw.as_str())));
        } else if let Some(statement) = caps.get(2) {
            apply_statement(&mut stack, statement.as_str().trim())?;
        } else if let Some(escaped) = caps.get(3) {
            if source[whole.end()..].starts_with('}') {
                return Err(TemplateError::AmbiguousClose(whole.start()));
            }
            current(&mut stack).push(Node::Escaped(parse_path(escaped.as_str())));
        }
    }
    push_text(&mut stack, &source[cursor..], cursor)?;

    if stack.len() > 1 {
        return Err(TemplateError::UnbalancedBlock("if".to_string()));
    }
    Ok(stack.pop().map(|root| root.then).unwrap_or_default())
}

fn current(stack: &mut [Frame]) -> &mut Vec<Node> {
    let last = stack.len() - 1;
    stack[last].nodes()
}

fn push_text(stack: &mut [Frame], text: &str, offset: usize) -> Result<(), TemplateError> {
    for delimiter in ["<#", "{{"] {
        if let Some(at) = text.find(delimiter) {
            return Err(TemplateError::Unterminated { delimiter, offset: offset + at });
        }
    }
    if !text.is_empty() {
        current(stack).push(Node::Text(text.to_string()));
    }
    Ok(())
}

fn apply_statement(stack: &mut Vec<Frame>, statement: &str) -> Result<(), TemplateError> {
    if let Some(condition) = statement.strip_prefix("if ") {
        let condition = condition.trim();
        let (negate, path) = match condition.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, condition),
        };
        stack.push(Frame {
            condition: Some((parse_path(path), negate)),
            then: Vec::new(),
            otherwise: None,
        });
        return Ok(());
    }

    match statement {
        "else" => match stack.last_mut() {
            Some(frame) if frame.condition.is_some() && frame.otherwise.is_none() => {
                frame.otherwise = Some(Vec::new());
                Ok(())
            }
            _ => Err(TemplateError::UnbalancedBlock("else".to_string())),
        },
        "end" => {
            if stack.len() < 2 {
                return Err(TemplateError::UnbalancedBlock("end".to_string()));
            }
            let Some(Frame { condition: Some((path, negate)), then, otherwise }) = stack.pop() else {
                return Err(TemplateError::UnbalancedBlock("end".to_string()));
            };
            current(stack).push(Node::If {
                path,
                negate,
                then,
                otherwise: otherwise.unwrap_or_default(),
            });
            Ok(())
        }
        other => Err(TemplateError::UnknownStatement(other.to_string())),
    }
}

fn parse_path(expr: &str) -> Vec<String> {
    let expr = expr.trim();
    let expr = match expr {
        "data" => "",
        _ => expr.strip_prefix("data.").unwrap_or(expr),
    };
    expr.split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.trim().to_string())
        .collect()
}

fn lookup<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(data, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn render_nodes(nodes: &[Node], data: &Value, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Raw(path) => out.push_str(&display(lookup(data, path))),
            Node::Escaped(path) => out.push_str(&escape_html(&display(lookup(data, path)))),
            Node::If { path, negate, then, otherwise } => {
                let truthy = lookup(data, path).is_some_and(is_truthy);
                if truthy != *negate {
                    render_nodes(then, data, out);
                } else {
                    render_nodes(otherwise, data, out);
                }
            }
        }
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// JavaScript-style truthiness over JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '`' => escaped.push_str("&#x60;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
