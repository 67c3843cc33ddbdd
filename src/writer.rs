use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tailcall::trampoline::{self, Next};

use crate::error::SaveError;
use crate::tree::Node;

/// Output layout for [`TreeWriter`].
#[derive(Debug, Clone, Copy)]
pub struct Format {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Optional character written around non-empty values.
    ///
    /// Values are emitted raw: embedded newlines, colons, or the quote
    /// character itself are not escaped, so only simple scalars are
    /// guaranteed to survive a save/load round trip.
    pub quote: Option<char>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            indent_width: 4,
            quote: None,
        }
    }
}

/// Serializes a [`Node`] tree back to indented text, children in order.
pub struct TreeWriter {
    format: Format,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self {
            format: Format::default(),
        }
    }

    pub fn with_format(format: Format) -> Self {
        Self { format }
    }

    pub fn save_to_path(&self, tree: &Node, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.save_to_writer(tree, &mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn save_to_writer<W: Write>(&self, tree: &Node, sink: W) -> Result<(), SaveError> {
        let machine = SaveMachine {
            format: self.format,
            sink,
            stack: vec![Frame {
                node: tree,
                next: 0,
            }],
        };
        run_save_machine(machine)
    }

    pub fn save_to_string(&self, tree: &Node) -> Result<String, SaveError> {
        let mut buf = Vec::new();
        self.save_to_writer(tree, &mut buf)?;
        String::from_utf8(buf)
            .map_err(|err| SaveError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }
}

impl Default for TreeWriter {
    fn default() -> Self {
        Self::new()
    }
}

struct Frame<'a> {
    node: &'a Node,
    next: usize,
}

/// Depth-first walk over the tree as an explicit frame stack, so output
/// depth is bounded by heap, not the native call stack.
struct SaveMachine<'a, W: Write> {
    format: Format,
    sink: W,
    stack: Vec<Frame<'a>>,
}

impl<'a, W: Write> SaveMachine<'a, W> {
    /// Emits at most one line, or closes one frame. Returns true once the
    /// stack is exhausted.
    fn run_step(&mut self) -> io::Result<bool> {
        let len = self.stack.len();
        if len == 0 {
            return Ok(true);
        }

        let (node, next) = {
            let frame = &mut self.stack[len - 1];
            let node: &'a Node = frame.node;
            let next = frame.next;
            frame.next += 1;
            (node, next)
        };

        match node.child_at(next) {
            None => {
                self.stack.pop();
            }
            Some(child) => {
                self.write_line(child, len - 1)?;
                self.stack.push(Frame {
                    node: child,
                    next: 0,
                });
            }
        }
        Ok(false)
    }

    fn write_line(&mut self, node: &Node, depth: usize) -> io::Result<()> {
        let pad = self.format.indent_width * depth;
        write!(self.sink, "{:pad$}{}:", "", node.name())?;
        if !node.value().is_empty() {
            match self.format.quote {
                Some(q) => write!(self.sink, " {q}{}{q}", node.value())?,
                None => write!(self.sink, " {}", node.value())?,
            }
        }
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    fn step(mut self) -> Next<Self, Result<(), SaveError>> {
        match self.run_step() {
            Ok(true) => Next::Finish(Ok(())),
            Ok(false) => Next::Recurse(self),
            Err(err) => Next::Finish(Err(err.into())),
        }
    }
}

fn run_save_machine<W: Write>(machine: SaveMachine<'_, W>) -> Result<(), SaveError> {
    trampoline::run(SaveMachine::step, machine)
}
