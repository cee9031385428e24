//! Line-oriented content format.
//!
//! Each line is a node: the first token is its key, the rest are values.
//! Lines indented deeper than the preceding node become its children.
//! Tokens containing whitespace are quoted with `"` or, if they contain a
//! double quote themselves, with backticks. `#` starts a comment.

use std::path::Path;

use crate::error::{ContentError, ContentIssue, Diagnostics, SourceLocation};

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    tokens: Vec<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    line: usize,
    column: usize,
}

/// A parsed file: a forest of nodes stored in one arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFile {
    name: String,
    nodes: Vec<NodeData>,
    roots: Vec<usize>,
}

/// Borrowed view of one node of a [`DataFile`].
#[derive(Debug, Clone, Copy)]
pub struct DataNode<'a> {
    file: &'a DataFile,
    index: usize,
}

impl DataFile {
    /// An empty file, for building nodes programmatically.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse text. Malformed lines are reported and parsed as well as
    /// possible.
    pub fn parse(name: &str, text: &str, diagnostics: &mut Diagnostics) -> Self {
        let mut file = DataFile::new(name);
        // (indent, node index) of the open ancestors.
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for (line_index, line) in text.lines().enumerate() {
            let line_number = line_index + 1;
            let indent = line.chars().take_while(|c| c.is_whitespace()).count();
            let (tokens, error) = tokenize(line);
            if tokens.is_empty() {
                continue;
            }

            while stack.last().is_some_and(|&(depth, _)| depth >= indent) {
                stack.pop();
            }
            let parent = stack.last().map(|&(_, index)| index);
            let index = file.push(parent, tokens, line_number, indent + 1);
            stack.push((indent, index));

            if let Some(message) = error {
                let node = file.node(index);
                diagnostics.report(node.issue(ContentError::Syntax { message }));
            }
        }
        file
    }

    /// Read and parse a file from disk.
    pub fn load(path: &Path, diagnostics: &mut Diagnostics) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path).map_err(|err| ContentError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self::parse(&path.display().to_string(), &text, diagnostics))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level nodes in file order.
    pub fn roots(&self) -> impl Iterator<Item = DataNode<'_>> + '_ {
        self.roots.iter().map(move |&index| self.node(index))
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Append a node; returns its index for adding children.
    pub fn add_root(&mut self, tokens: Vec<String>) -> usize {
        self.push(None, tokens, 0, 1)
    }

    pub fn add_child(&mut self, parent: usize, tokens: Vec<String>) -> usize {
        self.push(Some(parent), tokens, 0, 1)
    }

    /// Serialize back to text, one tab per nesting level.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.write_node(root, 0, &mut out);
        }
        out
    }

    fn write_node(&self, index: usize, depth: usize, out: &mut String) {
        let data = &self.nodes[index];
        for _ in 0..depth {
            out.push('\t');
        }
        let line: Vec<String> = data.tokens.iter().map(|t| quote(t)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
        for &child in &data.children {
            self.write_node(child, depth + 1, out);
        }
    }

    fn push(&mut self, parent: Option<usize>, tokens: Vec<String>, line: usize, column: usize) -> usize {
        let index = self.nodes.len();
        self.nodes.push(NodeData {
            tokens,
            parent,
            children: Vec::new(),
            line,
            column,
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    fn node(&self, index: usize) -> DataNode<'_> {
        DataNode { file: self, index }
    }
}

impl<'a> DataNode<'a> {
    fn data(&self) -> &'a NodeData {
        &self.file.nodes[self.index]
    }

    pub fn tokens(&self) -> &'a [String] {
        &self.data().tokens
    }

    pub fn size(&self) -> usize {
        self.data().tokens.len()
    }

    /// Token at `index`, or the empty string.
    pub fn token(&self, index: usize) -> &'a str {
        self.data().tokens.get(index).map_or("", String::as_str)
    }

    pub fn key(&self) -> &'a str {
        self.token(0)
    }

    pub fn is_number(&self, index: usize) -> bool {
        is_number(self.token(index))
    }

    /// Numeric value of a token. Missing or malformed tokens are reported
    /// and read as 0.
    pub fn value(&self, index: usize, diagnostics: &mut Diagnostics) -> f64 {
        if index >= self.size() {
            diagnostics.report(self.issue(ContentError::MissingValue {
                key: self.key().to_string(),
            }));
            return 0.0;
        }
        match parse_number(self.token(index)) {
            Some(value) => value,
            None => {
                diagnostics.report(self.issue(ContentError::BadNumber {
                    token: self.token(index).to_string(),
                }));
                0.0
            }
        }
    }

    /// Numeric value if present and well-formed, without reporting.
    pub fn try_value(&self, index: usize) -> Option<f64> {
        parse_number(self.token(index))
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = DataNode<'a>> + 'a {
        let file = self.file;
        self.data()
            .children
            .iter()
            .map(move |&index| DataNode { file, index })
    }

    pub fn parent(&self) -> Option<DataNode<'a>> {
        self.data().parent.map(|index| DataNode {
            file: self.file,
            index,
        })
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            file: self.file.name.clone(),
            line: self.data().line,
            column: self.data().column,
        }
    }

    /// Render this node and its ancestors, two spaces per level.
    pub fn print_trace(&self) -> String {
        let mut chain = vec![*self];
        let mut current = *self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
            .iter()
            .rev()
            .enumerate()
            .map(|(depth, node)| {
                let tokens: Vec<String> = node.tokens().iter().map(|t| quote(t)).collect();
                format!("{}{}", "  ".repeat(depth), tokens.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Wrap an error with this node's location and trace.
    pub fn issue(&self, error: ContentError) -> ContentIssue {
        ContentIssue::new(error, self.location(), self.print_trace())
    }

    /// Report that this node's key was not understood.
    pub fn report_unknown(&self, diagnostics: &mut Diagnostics) {
        diagnostics.report(self.issue(ContentError::UnknownToken {
            token: self.key().to_string(),
        }));
    }
}

/// Split a line into tokens, returning a syntax message for an
/// unterminated quote.
fn tokenize(line: &str) -> (Vec<String>, Option<String>) {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    let mut error = None;

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }
        if c == '"' || c == '`' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == c {
                    closed = true;
                    break;
                }
                token.push(next);
            }
            if !closed {
                error = Some(format!("closing quotation mark ({c}) is missing"));
            }
            tokens.push(token);
            continue;
        }
        let mut token = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_whitespace() {
                break;
            }
            token.push(next);
            chars.next();
        }
        tokens.push(token);
    }
    (tokens, error)
}

/// Quote a token for output if it needs it.
fn quote(token: &str) -> String {
    let needs_quotes = token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '#');
    let starts_with_quote = token.starts_with('"') || token.starts_with('`');
    if !needs_quotes && !starts_with_quote {
        return token.to_string();
    }
    if token.contains('"') {
        format!("`{token}`")
    } else {
        format!("\"{token}\"")
    }
}

/// Whether a token is a plain decimal number with optional sign, point and
/// exponent.
pub fn is_number(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let mut has_digit = false;
    let mut has_point = false;
    let mut has_exponent = false;
    let mut exponent_digit = false;
    let mut leading = true;
    for c in token.chars() {
        if leading {
            leading = false;
            if c == '-' || c == '+' {
                continue;
            }
        }
        match c {
            '.' if !has_point && !has_exponent => has_point = true,
            'e' | 'E' if has_digit && !has_exponent => {
                has_exponent = true;
                leading = true;
            }
            '0'..='9' if has_exponent => exponent_digit = true,
            '0'..='9' => has_digit = true,
            _ => return false,
        }
    }
    has_digit && (!has_exponent || exponent_digit)
}

fn parse_number(token: &str) -> Option<f64> {
    if !is_number(token) {
        return None;
    }
    token.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "outfit \"Heavy Laser\"\n\tcost 100\n\tweapon\n\t\tvelocity 12.5 # fast\n\t\t`quoted \"text\"`\nfleet Pirates\n";

    #[test]
    fn test_parse_structure() {
        let mut diagnostics = Diagnostics::new();
        let file = DataFile::parse("sample.txt", SAMPLE, &mut diagnostics);
        assert!(diagnostics.is_empty());

        let roots: Vec<_> = file.roots().collect();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].token(1), "Heavy Laser");
        let children: Vec<_> = roots[0].children().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].value(1, &mut diagnostics), 100.0);
        let weapon: Vec<_> = children[1].children().collect();
        assert_eq!(weapon[0].tokens(), ["velocity", "12.5"]);
        assert_eq!(weapon[1].key(), "quoted \"text\"");
        assert_eq!(weapon[0].location().line, 4);
    }

    #[test]
    fn test_bad_number_reports_and_defaults() {
        let mut diagnostics = Diagnostics::new();
        let file = DataFile::parse("bad.txt", "ship X\n\tmass heavy\n", &mut diagnostics);
        let ship = file.roots().next().unwrap();
        let mass = ship.children().next().unwrap();
        assert_eq!(mass.value(1, &mut diagnostics), 0.0);
        assert_eq!(diagnostics.len(), 1);
        let issue = &diagnostics.issues()[0];
        assert_eq!(issue.location.line, 2);
        assert_eq!(issue.trace, "ship X\n  mass heavy");
    }

    #[test]
    fn test_unterminated_quote() {
        let mut diagnostics = Diagnostics::new();
        let file = DataFile::parse("q.txt", "ship \"Broken\n", &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(file.roots().next().unwrap().token(1), "Broken");
    }

    #[test]
    fn test_numbers() {
        for good in ["1", "-2.5", "+.5", "3e4", "1E-3", "7."] {
            assert!(is_number(good), "{good}");
        }
        for bad in ["", "-", "e5", "1e", "abc", "1.2.3", "nan"] {
            assert!(!is_number(bad), "{bad}");
        }
    }

    #[test]
    fn test_write_then_parse() {
        let mut diagnostics = Diagnostics::new();
        let file = DataFile::parse("sample.txt", SAMPLE, &mut diagnostics);
        let text = file.to_text();
        let again = DataFile::parse("sample.txt", &text, &mut diagnostics);
        let tokens = |f: &DataFile| -> Vec<Vec<String>> {
            fn walk(node: DataNode<'_>, out: &mut Vec<Vec<String>>) {
                out.push(node.tokens().to_vec());
                for child in node.children() {
                    walk(child, out);
                }
            }
            let mut out = Vec::new();
            for root in f.roots() {
                walk(root, &mut out);
            }
            out
        };
        assert_eq!(tokens(&file), tokens(&again));
        assert!(diagnostics.is_empty());
    }
}
