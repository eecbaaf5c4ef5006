//! Statement model for the simulator input language.
//!
//! A netlist is an ordered sequence of single-line statements. Each line
//! either defines a named entity (a parameter, a function, an initial
//! condition, a circuit element) or directs the simulator (analysis cards,
//! comments, other dot directives). Classification decides how the merge
//! rules in [`crate::netlist::Document`] match a new statement against the
//! existing lines.

use std::fmt;

/// Directive class of a netlist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `*`-prefixed comment line. Never entity-defining, even when the
    /// comment text mentions a directive keyword.
    Comment,
    /// `.param` definition.
    Param,
    /// `.func` definition.
    Func,
    /// `.ic` initial-condition card.
    InitialCondition,
    /// Analysis card (`.tran`, `.ac`, `.dc`, `.op`, `.noise`, `.tf`, `.four`).
    Analysis,
    /// Circuit element line. The first token is the element name.
    Element,
    /// Any other dot directive (`.end`, `.backanno`, `.include`, ...).
    Other,
}

/// One line of simulator input: the trimmed source text plus its
/// classification.
///
/// Statements are immutable values. Editing happens at the document level
/// by replacing whole statements, never by mutating one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    text: String,
    kind: DirectiveKind,
}

impl Statement {
    /// Build a statement from one line of netlist text, stripping
    /// surrounding whitespace.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        let kind = classify(&text);
        Statement { text, kind }
    }

    /// The statement's source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The statement's directive class.
    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    /// Whether this statement defines a named entity whose definition can
    /// be overwritten (parameters, functions, initial conditions).
    pub fn is_definition(&self) -> bool {
        matches!(
            self.kind,
            DirectiveKind::Param | DirectiveKind::Func | DirectiveKind::InitialCondition
        )
    }

    /// The name of whatever this statement defines: for definitions, the
    /// trimmed text between the directive keyword and the `=`; for every
    /// other line, its first token.
    pub fn identifier(&self) -> &str {
        if self.is_definition() {
            let body = self
                .text
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest)
                .unwrap_or("");
            let name = body.split_once('=').map(|(name, _)| name).unwrap_or(body);
            return name.trim();
        }
        self.text.split_whitespace().next().unwrap_or("")
    }

    /// The comparison key used when merging this statement into a document.
    ///
    /// For definitions this is the raw text up to and including the first
    /// `=` (keyword, identifier, equals sign), so a re-definition of the
    /// same name matches regardless of its value. For every other line it
    /// is the first token. A definition missing its `=` yields an empty
    /// key, which the merge engine treats as unmatchable.
    pub fn match_key(&self) -> &str {
        if self.is_definition() {
            return match self.text.find('=') {
                Some(eq) => &self.text[..=eq],
                None => "",
            };
        }
        self.text.split_whitespace().next().unwrap_or("")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Classify one trimmed line. The comment marker wins over everything
/// else; reserved keywords are matched against the whole first token,
/// case-insensitively.
fn classify(text: &str) -> DirectiveKind {
    if text.starts_with('*') {
        return DirectiveKind::Comment;
    }
    let first = match text.split_whitespace().next() {
        Some(token) => token,
        None => return DirectiveKind::Other,
    };
    if !first.starts_with('.') {
        return DirectiveKind::Element;
    }
    match first.to_ascii_lowercase().as_str() {
        ".param" => DirectiveKind::Param,
        ".func" => DirectiveKind::Func,
        ".ic" => DirectiveKind::InitialCondition,
        ".tran" | ".ac" | ".dc" | ".op" | ".noise" | ".tf" | ".four" => DirectiveKind::Analysis,
        _ => DirectiveKind::Other,
    }
}
