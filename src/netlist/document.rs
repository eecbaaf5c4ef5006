//! Netlist documents and the merge engine.
//!
//! A [`Document`] owns an ordered list of [`Statement`]s and offers
//! functional-style editing: every operation consumes the document and
//! returns the updated one, so call sites chain edits and an original held
//! elsewhere is never touched. The interesting part is [`Document::insert`],
//! which decides whether a new statement replaces an existing line or is
//! spliced in next to its most similar neighbor.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::encoding::decode_auto;
use crate::error::{Result, SpiceRigError};
use crate::netlist::builder;
use crate::netlist::statement::{DirectiveKind, Statement};
use crate::result::FieldValue;

/// An ordered netlist. The first line is conventionally the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    statements: Vec<Statement>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Document { statements: Vec::new() }
    }

    /// Parse netlist text: one statement per line, surrounding whitespace
    /// stripped, blank lines dropped.
    pub fn parse(text: &str) -> Self {
        let statements = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Statement::new)
            .collect();
        Document { statements }
    }

    /// Read a netlist file, auto-detecting its encoding.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| SpiceRigError::read(path, e))?;
        let document = Document::parse(&decode_auto(&bytes));
        debug!(path = %path.display(), statements = document.len(), "read netlist");
        Ok(document)
    }

    /// Write the canonical text to `path`. This is byte-for-byte the text
    /// that [`Document::to_string`] produces and that the run cache hashes.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_string()).map_err(|e| SpiceRigError::write(path, e))?;
        debug!(path = %path.display(), statements = self.len(), "wrote netlist");
        Ok(())
    }

    /// The statements, in document order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The document title: the first line with any leading comment markers
    /// and whitespace stripped. Empty for an empty document.
    pub fn title(&self) -> &str {
        self.statements
            .first()
            .map(|s| s.text().trim_start_matches('*').trim_start())
            .unwrap_or("")
    }

    /// Replace the title line wholesale. The merge engine cannot identify
    /// title lines (they carry no keyword), so this is a dedicated edit of
    /// line zero. On an empty document the title becomes the only line.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let statement = Statement::new(title);
        if self.statements.is_empty() {
            self.statements.push(statement);
        } else {
            self.statements[0] = statement;
        }
        self
    }

    /// Merge one statement into the document.
    ///
    /// Every existing line is scored against the new statement's comparison
    /// key (see [`Statement::match_key`]): the score is the length in
    /// characters of the longest common case-insensitive prefix of the line
    /// and the key, so a line that starts with the whole key scores the full
    /// key length. With `best` the first index achieving the maximum score:
    ///
    /// - maximum score equal to the key length: the line at `best` is
    ///   replaced (a re-defined parameter overwrites its old line);
    /// - maximum score zero (empty document, empty key, or no line sharing
    ///   any prefix): the statement is appended at the end;
    /// - otherwise the statement is inserted immediately after `best`, so
    ///   new lines land next to their most similar neighbor.
    pub fn insert(mut self, statement: Statement) -> Self {
        let (best, max_score, key_len) = {
            let key = statement.match_key();
            let mut best = 0;
            let mut max_score = 0;
            for (i, existing) in self.statements.iter().enumerate() {
                let score = similarity(existing.text(), key);
                if score > max_score {
                    max_score = score;
                    best = i;
                }
            }
            (best, max_score, key.chars().count())
        };

        if max_score == 0 {
            self.statements.push(statement);
        } else if max_score == key_len {
            self.statements[best] = statement;
        } else {
            self.statements.insert(best + 1, statement);
        }
        self
    }

    /// Merge a batch of statements, flattened depth-first and folded
    /// left-to-right through [`Document::insert`]. Later statements see the
    /// document as already modified by earlier ones, so of two statements
    /// sharing a comparison key the later one wins.
    pub fn insert_many<S: IntoStatements>(self, statements: S) -> Self {
        statements
            .into_statements()
            .into_iter()
            .fold(self, |document, statement| document.insert(statement))
    }

    /// Merge one parameter definition per `(name, value)` pair.
    pub fn apply_params<N, V, I>(self, params: I) -> Self
    where
        N: std::fmt::Display,
        V: std::fmt::Display,
        I: IntoIterator<Item = (N, V)>,
    {
        let statements: Vec<Statement> = params
            .into_iter()
            .map(|(name, value)| builder::param(name, value))
            .collect();
        self.insert_many(statements)
    }

    /// Overwrite the value of an existing parameter definition, matched by
    /// identifier (case-insensitive). If no such parameter exists the
    /// document is returned unchanged and a warning is logged; use
    /// [`Document::insert`] to add new parameters.
    pub fn replace_param(mut self, name: &str, value: impl std::fmt::Display) -> Self {
        let position = self.statements.iter().position(|s| {
            s.kind() == DirectiveKind::Param && s.identifier().eq_ignore_ascii_case(name)
        });
        match position {
            Some(i) => self.statements[i] = builder::param(name, value),
            None => warn!(param = name, "no such parameter, document unchanged"),
        }
        self
    }

    /// Parameter definitions as `(identifier, value)` pairs in document
    /// order, values parsed numerically where possible. Definitions
    /// missing an `=` are skipped.
    pub fn params(&self) -> Vec<(String, FieldValue)> {
        self.statements
            .iter()
            .filter(|s| s.kind() == DirectiveKind::Param)
            .filter_map(|s| {
                let (_, value) = s.text().split_once('=')?;
                Some((s.identifier().to_string(), FieldValue::from_text(value.trim())))
            })
            .collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<&str> = self.statements.iter().map(|s| s.text()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Length in characters of the longest common case-insensitive prefix of a
/// document line and a comparison key. Equals the key's full length exactly
/// when the line starts with the key.
fn similarity(line: &str, key: &str) -> usize {
    line.chars()
        .zip(key.chars())
        .take_while(|(l, k)| l.eq_ignore_ascii_case(k))
        .count()
}

/// Conversion into a flat statement list, so [`Document::insert_many`] can
/// take a single statement or an arbitrarily nested collection of them.
/// Flattening is depth-first and order-preserving.
pub trait IntoStatements {
    fn into_statements(self) -> Vec<Statement>;
}

impl IntoStatements for Statement {
    fn into_statements(self) -> Vec<Statement> {
        vec![self]
    }
}

impl<S: IntoStatements> IntoStatements for Vec<S> {
    fn into_statements(self) -> Vec<Statement> {
        self.into_iter().flat_map(S::into_statements).collect()
    }
}

impl<S: IntoStatements, const N: usize> IntoStatements for [S; N] {
    fn into_statements(self) -> Vec<Statement> {
        self.into_iter().flat_map(S::into_statements).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::builder::param;

    fn sample() -> Document {
        Document::parse(
            "* NDR oscillator\n\
             R1 in out 1k\n\
             C1 out 0 10n\n\
             .param RL=50\n\
             .param TD=5n\n\
             .tran 0 1u 0 1n\n\
             .end",
        )
    }

    fn texts(document: &Document) -> Vec<&str> {
        document.statements().iter().map(|s| s.text()).collect()
    }

    #[test]
    fn test_parse_drops_blank_lines_and_trims() {
        let document = Document::parse("  * title \r\n\r\n R1 a b 1 \n\n.end\n");
        assert_eq!(texts(&document), vec!["* title", "R1 a b 1", ".end"]);
    }

    #[test]
    fn test_display_is_newline_joined() {
        let document = sample();
        let round = Document::parse(&document.to_string());
        assert_eq!(document, round);
        assert!(document.to_string().starts_with("* NDR oscillator\nR1"));
    }

    #[test]
    fn test_title_strips_comment_marker() {
        assert_eq!(sample().title(), "NDR oscillator");
        assert_eq!(Document::parse("plain title\n.end").title(), "plain title");
        assert_eq!(Document::new().title(), "");
    }

    #[test]
    fn test_with_title_replaces_first_line() {
        let document = sample().with_title("* renamed");
        assert_eq!(document.title(), "renamed");
        assert_eq!(document.len(), sample().len());

        let fresh = Document::new().with_title("* only line");
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh.title(), "only line");
    }

    #[test]
    fn test_insert_replaces_existing_param_in_place() {
        let before = sample();
        let rl_index = 3;
        assert_eq!(before.statements()[rl_index].text(), ".param RL=50");

        let after = before.clone().insert(param("RL", 100));
        assert_eq!(after.len(), before.len());
        assert_eq!(after.statements()[rl_index].text(), ".PARAM RL=100");
    }

    #[test]
    fn test_insert_fresh_param_lands_in_param_block() {
        // ".PARAM CL=" shares ".param " with both definitions; the first of
        // the tied lines wins, so the new line lands right after RL.
        let document = sample().insert(param("CL", "1p"));
        assert_eq!(document.len(), sample().len() + 1);
        assert_eq!(document.statements()[4].text(), ".PARAM CL=1p");
        assert_eq!(document.statements()[3].text(), ".param RL=50");
        assert_eq!(document.statements()[5].text(), ".param TD=5n");
    }

    #[test]
    fn test_insert_element_lands_after_similar_element() {
        let document = sample().insert(Statement::new("R2 out 0 2k"));
        assert_eq!(document.statements()[2].text(), "R2 out 0 2k");
        assert_eq!(document.statements()[1].text(), "R1 in out 1k");
    }

    #[test]
    fn test_insert_without_shared_prefix_appends() {
        let document = sample().insert(Statement::new("XU1 a b opamp"));
        assert_eq!(document.statements().last().unwrap().text(), "XU1 a b opamp");
    }

    #[test]
    fn test_insert_into_empty_document_appends() {
        let document = Document::new().insert(param("RL", 50));
        assert_eq!(texts(&document), vec![".PARAM RL=50"]);
    }

    #[test]
    fn test_insert_with_empty_key_appends() {
        // A definition missing its `=` has an empty comparison key and can
        // never replace anything, in particular not the title line.
        let document = sample().insert(Statement::new(".param dangling"));
        assert_eq!(document.len(), sample().len() + 1);
        assert_eq!(document.statements()[0].text(), "* NDR oscillator");
        assert_eq!(document.statements().last().unwrap().text(), ".param dangling");
    }

    #[test]
    fn test_repeated_insert_is_idempotent_on_length() {
        let base = sample();
        let once = base.clone().insert(param("X", "1"));
        assert_eq!(once.len(), base.len() + 1);

        let twice = once.clone().insert(param("X", "2"));
        assert_eq!(twice.len(), once.len());
        let x_lines: Vec<&str> = twice
            .statements()
            .iter()
            .map(|s| s.text())
            .filter(|t| t.starts_with(".PARAM X="))
            .collect();
        assert_eq!(x_lines, vec![".PARAM X=2"]);
    }

    #[test]
    fn test_insert_does_not_touch_the_original() {
        let original = sample();
        let kept = original.clone();
        let _modified = original.insert(param("RL", 999));
        assert_eq!(kept, sample());
    }

    #[test]
    fn test_insert_many_later_statement_wins() {
        let document = sample().insert_many(vec![param("RL", "1"), param("RL", "2")]);
        let rl_lines: Vec<&str> = document
            .statements()
            .iter()
            .map(|s| s.text())
            .filter(|t| t.to_ascii_lowercase().starts_with(".param rl="))
            .collect();
        assert_eq!(rl_lines, vec![".PARAM RL=2"]);
    }

    #[test]
    fn test_insert_many_flattens_nested_collections() {
        // C's key ties against both existing param lines, so the
        // first-index tie-break lands it right after A, not at the end.
        let document = Document::new().insert_many(vec![
            vec![param("A", 1), param("B", 2)],
            vec![param("C", 3)],
        ]);
        assert_eq!(
            texts(&document),
            vec![".PARAM A=1", ".PARAM C=3", ".PARAM B=2"]
        );
    }

    #[test]
    fn test_apply_params() {
        let document = sample().apply_params([("RL", "75"), ("CL", "1p")]);
        assert_eq!(document.len(), sample().len() + 1);
        assert!(texts(&document).contains(&".PARAM RL=75"));
        assert!(texts(&document).contains(&".PARAM CL=1p"));
    }

    #[test]
    fn test_replace_param_overwrites_value() {
        let document = sample().replace_param("rl", 75);
        assert_eq!(document.statements()[3].text(), ".PARAM rl=75");
        assert_eq!(document.len(), sample().len());
    }

    #[test]
    fn test_replace_param_missing_target_is_unchanged() {
        let document = sample().replace_param("nope", 1);
        assert_eq!(document, sample());
    }

    #[test]
    fn test_params_parse_numeric_values() {
        let params = sample().params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "RL");
        assert_eq!(params[0].1, FieldValue::Integer(50));
        assert_eq!(params[1].0, "TD");
        assert_eq!(params[1].1, FieldValue::Text("5n".to_string()));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("osc.net");
        let document = sample();
        document.write_to(&path).unwrap();
        assert_eq!(Document::from_file(&path).unwrap(), document);
    }

    #[test]
    fn test_from_file_decodes_utf16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echoed.net");
        let bytes = crate::encoding::to_utf16le("* title\nR1 a b 1k\n.end\n");
        std::fs::write(&path, bytes).unwrap();
        let document = Document::from_file(&path).unwrap();
        assert_eq!(texts(&document), vec!["* title", "R1 a b 1k", ".end"]);
    }
}
