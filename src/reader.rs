use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LoadError, ParseError};
use crate::parse::{BlockStyle, LineEvent, LineParser};
use crate::tree::Node;

/// Loads indented mapping text into a caller-owned [`Node`] tree.
///
/// The target tree is cleared up front and mutated in place, so a load
/// that fails mid-stream leaves every node added before the failing line
/// in the tree. Callers that need atomicity should load into a scratch
/// tree and swap it in on success.
pub struct TreeReader {
    quote: Option<char>,
}

impl TreeReader {
    pub fn new() -> Self {
        Self { quote: None }
    }

    /// Reader that also strips a matching pair of `quote` characters from
    /// single-line values.
    pub fn with_quote(quote: char) -> Self {
        Self { quote: Some(quote) }
    }

    pub fn load_from_path(&self, tree: &mut Node, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let file = File::open(path)?;
        self.load_from_reader(tree, BufReader::new(file))
    }

    pub fn load_from_str(&self, tree: &mut Node, text: &str) -> Result<(), LoadError> {
        self.load_from_reader(tree, text.as_bytes())
    }

    pub fn load_from_reader<R: BufRead>(
        &self,
        tree: &mut Node,
        reader: R,
    ) -> Result<(), LoadError> {
        tree.clear();
        let mut session = LoadSession::new(self.quote);

        let mut outcome = Ok(());
        for line in reader.lines() {
            let step = match line {
                Ok(line) => session.consume(tree, &line).map_err(LoadError::from),
                Err(err) => Err(LoadError::from(err)),
            };
            if let Err(err) = step {
                outcome = Err(err);
                break;
            }
        }
        // Attach whatever is still open, so a failed load keeps every node
        // seen before the offending line.
        session.finish(tree);
        outcome
    }
}

impl Default for TreeReader {
    fn default() -> Self {
        Self::new()
    }
}

/// One load in flight: the parser session plus the stack of open nodes.
///
/// The stack mirrors the parser's indent stack; the top entry is the most
/// recent declaration's node, each entry below it the open node one level
/// up. Nodes attach to their parent when their level closes.
struct LoadSession {
    parser: LineParser,
    stack: Vec<Node>,
    mode: Option<BlockStyle>,
}

impl LoadSession {
    fn new(quote: Option<char>) -> Self {
        Self {
            parser: LineParser::with_quote(quote),
            stack: Vec::new(),
            mode: None,
        }
    }

    fn consume(&mut self, tree: &mut Node, line: &str) -> Result<(), ParseError> {
        match self.parser.parse_line(line)? {
            LineEvent::Skip => {}
            LineEvent::Declaration {
                name,
                value,
                indent_delta,
                block,
            } => {
                // One slot for the sibling being replaced, plus one per
                // closed nesting level.
                let pops = (1 - indent_delta).max(0) as usize;
                for _ in 0..pops {
                    match self.stack.pop() {
                        Some(node) => attach(&mut self.stack, tree, node),
                        None => break,
                    }
                }
                self.stack.push(Node::new(name, value));
                self.mode = block;
            }
            LineEvent::Continuation { fragment } => {
                if let Some(node) = self.stack.last_mut() {
                    match self.mode {
                        Some(BlockStyle::Literal) => append_literal(node.value_mut(), fragment),
                        Some(BlockStyle::Folded) => append_folded(node.value_mut(), fragment),
                        None => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(mut self, tree: &mut Node) {
        while let Some(node) = self.stack.pop() {
            attach(&mut self.stack, tree, node);
        }
    }
}

fn attach(stack: &mut Vec<Node>, tree: &mut Node, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.push_child(node),
        None => tree.push_child(node),
    }
}

/// Literal blocks keep one line break per source line.
fn append_literal(value: &mut String, fragment: &str) {
    if value.is_empty() {
        value.push_str(fragment);
    } else {
        value.push('\n');
        value.push_str(fragment);
    }
}

/// Folded blocks join adjacent lines with spaces; a blank line becomes a
/// single line break.
fn append_folded(value: &mut String, fragment: &str) {
    if fragment.is_empty() {
        value.push('\n');
    } else if value.is_empty() || value.ends_with('\n') {
        value.push_str(fragment);
    } else {
        value.push(' ');
        value.push_str(fragment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Node {
        let mut tree = Node::root();
        TreeReader::new()
            .load_from_str(&mut tree, text)
            .expect("load should succeed");
        tree
    }

    #[test]
    fn nested_and_sibling_declarations() {
        let tree = load("a:\n  b: 1\n  c: 2\nd: 3\n");

        assert_eq!(tree.child_count(), 2);
        let a = tree.child_at(0).expect("a");
        assert_eq!(a.name(), "a");
        assert_eq!(a.value(), "");
        assert_eq!(a.child_count(), 2);
        assert_eq!(a.child_at(0).map(Node::value), Some("1"));
        assert_eq!(a.child_at(1).map(Node::value), Some("2"));
        let d = tree.child_at(1).expect("d");
        assert_eq!(d.name(), "d");
        assert_eq!(d.value(), "3");
    }

    #[test]
    fn literal_block_preserves_line_breaks() {
        let tree = load("desc: |\n  line1\n  line2\n");
        assert_eq!(tree.find("desc").map(Node::value), Some("line1\nline2"));
    }

    #[test]
    fn folded_block_joins_lines_and_breaks_paragraphs() {
        let tree = load("desc: >\n  word1\n  word2\n\n  word3\n");
        assert_eq!(
            tree.find("desc").map(Node::value),
            Some("word1 word2\nword3")
        );
    }

    #[test]
    fn literal_block_keeps_extra_indentation() {
        let tree = load("a:\n  b: |\n    l1\n     l2\n  c: x\n");
        let a = tree.child_at(0).expect("a");
        assert_eq!(a.find("b").map(Node::value), Some("l1\n l2"));
        assert_eq!(a.find("c").map(Node::value), Some("x"));
    }

    #[test]
    fn literal_block_may_be_empty() {
        let tree = load("a: |\nb: 2\n");
        assert_eq!(tree.find("a").map(Node::value), Some(""));
        assert_eq!(tree.find("b").map(Node::value), Some("2"));
    }

    #[test]
    fn declaration_after_block_is_a_sibling() {
        let tree = load("a: |\n  text\nb: 2\n");
        assert_eq!(tree.child_count(), 2);
        assert_eq!(tree.find("a").map(Node::value), Some("text"));
        assert_eq!(tree.find("b").map(Node::value), Some("2"));
    }

    #[test]
    fn comments_and_blanks_produce_no_nodes() {
        let tree = load("# heading\n\na: 1\n   \n# middle\nb: 2\n");
        assert_eq!(tree.child_count(), 2);
        assert_eq!(tree.child_at(0).map(Node::name), Some("a"));
        assert_eq!(tree.child_at(1).map(Node::name), Some("b"));
    }

    #[test]
    fn quoted_values_are_stripped_on_read() {
        let mut tree = Node::root();
        TreeReader::with_quote('"')
            .load_from_str(&mut tree, "a: \"hello world\"\n")
            .expect("load should succeed");
        assert_eq!(tree.find("a").map(Node::value), Some("hello world"));
    }

    #[test]
    fn load_clears_previous_contents() {
        let mut tree = Node::root();
        tree.add_child("stale", "old");
        TreeReader::new()
            .load_from_str(&mut tree, "fresh: 1\n")
            .expect("load should succeed");
        assert_eq!(tree.child_count(), 1);
        assert_eq!(tree.child_at(0).map(Node::name), Some("fresh"));
    }

    #[test]
    fn failed_load_keeps_nodes_before_the_bad_line() {
        let mut tree = Node::root();
        let err = TreeReader::new()
            .load_from_str(&mut tree, "a: 1\nb:\n  c: 2\noops\n")
            .expect_err("missing colon must fail");
        assert!(matches!(err, LoadError::Parse(ParseError::Syntax { line: 4, .. })));

        assert_eq!(tree.child_count(), 2);
        let b = tree.child_at(1).expect("b");
        assert_eq!(b.find("c").map(Node::value), Some("2"));
    }

    #[test]
    fn bad_dedent_fails_the_load() {
        let mut tree = Node::root();
        let err = TreeReader::new()
            .load_from_str(&mut tree, "a:\n    b: 1\n  c: 2\n")
            .expect_err("bad dedent must fail");
        assert!(matches!(
            err,
            LoadError::Parse(ParseError::Indentation { line: 3, width: 2 })
        ));
    }
}
