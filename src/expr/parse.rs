//! Expression tokenizer and compiler.
//!
//! Tokens are whitespace-separated except for parenthesized variable
//! references, which may contain spaces (`(A:EXTERNAL POWER ON:1, BOOL)`).
//! Compilation tracks abstract stack depth, so underflow is a load-time
//! error rather than a runtime surprise, and conditional blocks must leave
//! the stack exactly as deep as they found it. A missing `}` at the end of
//! the source closes every open block implicitly; production catalogue
//! data relies on that.

use crate::error::ExprError;
use crate::expr::program::Instr;

/// Compiles source text into an instruction list.
pub(crate) fn compile(source: &str) -> Result<Vec<Instr>, ExprError> {
    Parser::new(source).run()
}

struct Frame {
    if_offset: usize,
    outer: Vec<Instr>,
    depth_at_entry: usize,
}

struct Parser<'a> {
    src: &'a str,
    current: Vec<Instr>,
    frames: Vec<Frame>,
    depth: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            current: Vec::new(),
            frames: Vec::new(),
            depth: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Instr>, ExprError> {
        let mut lexer = Lexer::new(self.src);
        while let Some((offset, token)) = lexer.next_token()? {
            self.step(offset, token)?;
        }
        while let Some(frame) = self.frames.pop() {
            self.close_block(frame)?;
        }
        Ok(self.current)
    }

    fn step(&mut self, offset: usize, token: &str) -> Result<(), ExprError> {
        match token {
            "==" => self.binary(Instr::Eq, "==", offset),
            "<" => self.binary(Instr::Lt, "<", offset),
            "&&" => self.binary(Instr::And, "&&", offset),
            "||" => self.binary(Instr::Or, "||", offset),
            "!" => {
                self.require(1, "!", offset)?;
                self.current.push(Instr::Not);
                Ok(())
            }
            "if{" => self.open_block(offset),
            "}" => {
                let frame = self
                    .frames
                    .pop()
                    .ok_or(ExprError::StrayBlockClose { offset })?;
                self.close_block(frame)
            }
            _ if token.starts_with('(') => self.var_ref(offset, token),
            _ => self.number(offset, token),
        }
    }

    fn require(&self, needed: usize, op: &str, offset: usize) -> Result<(), ExprError> {
        if self.depth < needed {
            return Err(ExprError::StackUnderflow {
                op: op.to_string(),
                offset,
            });
        }
        Ok(())
    }

    fn binary(&mut self, instr: Instr, op: &str, offset: usize) -> Result<(), ExprError> {
        self.require(2, op, offset)?;
        self.depth -= 1;
        self.current.push(instr);
        Ok(())
    }

    fn number(&mut self, offset: usize, token: &str) -> Result<(), ExprError> {
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.depth += 1;
                self.current.push(Instr::Push(value));
                Ok(())
            }
            _ => Err(ExprError::UnknownToken {
                token: token.to_string(),
                offset,
            }),
        }
    }

    fn open_block(&mut self, offset: usize) -> Result<(), ExprError> {
        self.require(1, "if{", offset)?;
        self.depth -= 1;
        self.frames.push(Frame {
            if_offset: offset,
            outer: std::mem::take(&mut self.current),
            depth_at_entry: self.depth,
        });
        Ok(())
    }

    fn close_block(&mut self, frame: Frame) -> Result<(), ExprError> {
        if self.depth != frame.depth_at_entry {
            return Err(ExprError::UnbalancedBlock {
                offset: frame.if_offset,
            });
        }
        let block = std::mem::replace(&mut self.current, frame.outer);
        self.current.push(Instr::If(block));
        Ok(())
    }

    fn var_ref(&mut self, offset: usize, token: &str) -> Result<(), ExprError> {
        let unknown = || ExprError::UnknownToken {
            token: token.to_string(),
            offset,
        };
        let inner = token
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(unknown)?;

        if let Some(name) = inner.strip_prefix("L:") {
            if name.is_empty() {
                return Err(unknown());
            }
            self.depth += 1;
            self.current.push(Instr::ReadFlag(name.to_string()));
        } else if let Some(body) = inner.strip_prefix("A:") {
            let (name, index, unit) = parse_sim_ref(body).ok_or_else(unknown)?;
            self.depth += 1;
            self.current.push(Instr::ReadSim { name, index, unit });
        } else if let Some(name) = inner.strip_prefix(">L:") {
            if name.is_empty() {
                return Err(unknown());
            }
            self.require(1, token, offset)?;
            self.depth -= 1;
            self.current.push(Instr::WriteFlag(name.to_string()));
        } else if let Some(body) = inner.strip_prefix(">K:") {
            let (name, index) = parse_event_ref(body).ok_or_else(unknown)?;
            self.require(1, token, offset)?;
            self.depth -= 1;
            self.current.push(Instr::TriggerEvent { name, index });
        } else {
            return Err(unknown());
        }
        Ok(())
    }
}

/// `NAME`, `NAME:index`, optionally followed by `, Unit`.
fn parse_sim_ref(body: &str) -> Option<(String, Option<u32>, Option<String>)> {
    let (name_part, unit) = match body.rfind(',') {
        Some(pos) => {
            let unit = body[pos + 1..].trim();
            if unit.is_empty() {
                return None;
            }
            (body[..pos].trim(), Some(unit.to_string()))
        }
        None => (body.trim(), None),
    };
    if name_part.is_empty() {
        return None;
    }
    let (name, index) = split_trailing_index(name_part);
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), index, unit))
}

/// `NAME` or `<index>:NAME`.
fn parse_event_ref(body: &str) -> Option<(String, Option<u32>)> {
    if body.is_empty() {
        return None;
    }
    if let Some(pos) = body.find(':') {
        let prefix = &body[..pos];
        if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
            let name = &body[pos + 1..];
            if name.is_empty() {
                return None;
            }
            let index: u32 = prefix.parse().ok()?;
            return Some((name.to_string(), Some(index)));
        }
    }
    Some((body.to_string(), None))
}

/// Splits a trailing all-digit `:<index>` suffix off a simulator name.
fn split_trailing_index(name: &str) -> (&str, Option<u32>) {
    if let Some(pos) = name.rfind(':') {
        let suffix = &name[pos + 1..];
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = suffix.parse() {
                return (&name[..pos], Some(index));
            }
        }
    }
    (name, None)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn next_token(&mut self) -> Result<Option<(usize, &'a str)>, ExprError> {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return Ok(None);
        }
        let start = self.pos;
        if bytes[start] == b'(' {
            // Parenthesized references may contain spaces; scan to the close.
            match self.src[start..].find(')') {
                Some(rel) => {
                    let end = start + rel + 1;
                    self.pos = end;
                    Ok(Some((start, &self.src[start..end])))
                }
                None => Err(ExprError::UnknownToken {
                    token: self.src[start..].to_string(),
                    offset: start,
                }),
            }
        } else {
            let mut end = start;
            while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
                end += 1;
            }
            self.pos = end;
            Ok(Some((start, &self.src[start..end])))
        }
    }
}
