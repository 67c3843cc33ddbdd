//! Line-level grammar: classifies one physical line at a time and tracks
//! the indent stack that turns flat lines back into a hierarchy.

use crate::error::ParseError;

/// Multi-line scalar mode introduced by a `|` or `>` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// Newline-preserving block, introduced by `|`.
    Literal,
    /// Space-joining block, introduced by `>`; blank lines break paragraphs.
    Folded,
}

/// Outcome of feeding one physical line to [`LineParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// A new key, possibly opening a multi-line block.
    Declaration {
        name: &'a str,
        value: &'a str,
        /// Nesting levels opened (positive) or closed (negative) relative
        /// to the previous declaration.
        indent_delta: isize,
        block: Option<BlockStyle>,
    },
    /// Content of the currently open multi-line block, with the block's
    /// baseline indentation stripped.
    Continuation { fragment: &'a str },
    /// Blank or comment line outside any block.
    Skip,
}

/// Stateful classifier for one parse session.
///
/// Holds the indent stack and multi-line bookkeeping for a single stream
/// of lines. Not shareable across parses; call [`reset`](Self::reset) or
/// build a fresh instance before starting a new session.
pub struct LineParser {
    indent_stack: Vec<usize>,
    prev_indent: usize,
    pending: Option<BlockStyle>,
    active: Option<BlockStyle>,
    block_base: Option<usize>,
    quote: Option<char>,
    line_no: usize,
}

impl LineParser {
    pub fn new() -> Self {
        Self::with_quote(None)
    }

    /// Parser that also strips a matching pair of `quote` characters from
    /// single-line values.
    pub fn with_quote(quote: Option<char>) -> Self {
        Self {
            indent_stack: Vec::new(),
            prev_indent: 0,
            pending: None,
            active: None,
            block_base: None,
            quote,
            line_no: 0,
        }
    }

    /// Clears all session state so the instance can drive a new parse.
    pub fn reset(&mut self) {
        self.indent_stack.clear();
        self.prev_indent = 0;
        self.pending = None;
        self.active = None;
        self.block_base = None;
        self.line_no = 0;
    }

    /// Classifies the next physical line of the session.
    pub fn parse_line<'a>(&mut self, raw: &'a str) -> Result<LineEvent<'a>, ParseError> {
        self.line_no += 1;
        if raw.contains('\t') {
            return Err(ParseError::Syntax {
                line: self.line_no,
                message: "tab not allowed",
            });
        }

        // A `|` or `>` value takes effect on the line after its declaration.
        if let Some(style) = self.pending.take() {
            self.active = Some(style);
            self.block_base = None;
        }

        if self.active.is_some() {
            // Blank lines are block content (folded blocks read them as
            // paragraph marks), never block terminators.
            if raw.trim().is_empty() {
                return Ok(LineEvent::Continuation { fragment: "" });
            }
            let ind = leading_spaces(raw);
            let base = *self.block_base.get_or_insert(ind);
            if ind > self.prev_indent {
                return Ok(LineEvent::Continuation {
                    fragment: strip_columns(raw, base),
                });
            }
            // Not indented past the owning declaration: the block is over
            // and this line is an ordinary declaration.
            self.active = None;
            self.block_base = None;
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(LineEvent::Skip);
        }

        let colon = raw.find(':').ok_or_else(|| ParseError::Syntax {
            line: self.line_no,
            message: "missing ':'",
        })?;
        let name_field = &raw[..colon];
        let ind = leading_spaces(name_field);
        let indent_delta = self.shift_level(ind)?;
        self.prev_indent = ind;

        let name = name_field.trim();
        let rest = raw[colon + 1..].trim();
        let (value, block) = match rest {
            "|" => ("", Some(BlockStyle::Literal)),
            ">" => ("", Some(BlockStyle::Folded)),
            _ => (unquote(self.quote, rest), None),
        };
        self.pending = block;

        Ok(LineEvent::Declaration {
            name,
            value,
            indent_delta,
            block,
        })
    }

    /// Updates the indent stack for a declaration at width `ind` and
    /// returns the signed level delta against the previous declaration.
    fn shift_level(&mut self, ind: usize) -> Result<isize, ParseError> {
        let prev_pos = self
            .indent_stack
            .iter()
            .position(|&width| width == self.prev_indent)
            .unwrap_or(0);

        let new_pos = match self.indent_stack.last().copied() {
            None => {
                self.indent_stack.push(ind);
                0
            }
            Some(top) if ind == top => self.indent_stack.len() - 1,
            Some(top) if ind > top => {
                self.indent_stack.push(ind);
                self.indent_stack.len() - 1
            }
            Some(_) => {
                while self.indent_stack.last().map_or(false, |&width| width > ind) {
                    self.indent_stack.pop();
                }
                if self.indent_stack.last() != Some(&ind) {
                    return Err(ParseError::Indentation {
                        line: self.line_no,
                        width: ind,
                    });
                }
                self.indent_stack.len() - 1
            }
        };

        Ok(new_pos as isize - prev_pos as isize)
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn leading_spaces(s: &str) -> usize {
    s.chars().take_while(|c| *c == ' ').count()
}

/// Strips up to `base` leading space columns, never cutting into content.
fn strip_columns(line: &str, base: usize) -> &str {
    let bytes = line.as_bytes();
    let mut cut = 0;
    while cut < base && cut < bytes.len() && bytes[cut] == b' ' {
        cut += 1;
    }
    &line[cut..]
}

fn unquote(quote: Option<char>, value: &str) -> &str {
    match quote {
        Some(q) => value
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
            .unwrap_or(value),
        None => value,
    }
}
