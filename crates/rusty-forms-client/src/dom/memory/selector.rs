// File: src/dom/memory/selector.rs
// Purpose: Selector subset understood by the in-memory document

use thiserror::Error;

use super::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unexpected end of selector, expected `{expected}`")]
    UnexpectedEnd { expected: char },
    #[error("unsupported pseudo-class `:{0}`")]
    UnsupportedPseudo(String),
}

/// Comma-separated list of complex selectors
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectorList(Vec<Complex>);

/// Compounds joined by combinators; each entry records how it relates to the
/// entry before it (ignored for the first)
#[derive(Debug, Clone, PartialEq)]
struct Complex(Vec<(Combinator, Compound)>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudo: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq)]
enum AttrCondition {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Pseudo {
    Checked,
    Disabled,
    Enabled,
    Not(Box<Compound>),
}

impl SelectorList {
    pub(crate) fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut cursor = Cursor::new(input);
        let mut list = Vec::new();

        loop {
            list.push(cursor.complex()?);
            cursor.skip_ws();
            match cursor.peek() {
                None => break,
                Some(',') => {
                    cursor.bump();
                }
                Some(found) => {
                    return Err(SelectorError::Unexpected {
                        found,
                        offset: cursor.pos,
                    })
                }
            }
        }

        Ok(Self(list))
    }

    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.0.iter().any(|complex| matches_chain(tree, &complex.0, node))
    }
}

fn matches_chain(tree: &Tree, parts: &[(Combinator, Compound)], node: NodeId) -> bool {
    let Some(((combinator, last), rest)) = parts.split_last() else {
        return false;
    };
    if !last.matches(tree, node) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match combinator {
        Combinator::Child => tree
            .parent_of(node)
            .is_some_and(|parent| matches_chain(tree, rest, parent)),
        Combinator::Descendant => {
            let mut cursor = tree.parent_of(node);
            while let Some(ancestor) = cursor {
                if matches_chain(tree, rest, ancestor) {
                    return true;
                }
                cursor = tree.parent_of(ancestor);
            }
            false
        }
    }
}

impl Compound {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(data) = tree.element(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !data.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if data.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| data.classes.contains(class)) {
            return false;
        }

        let attrs_match = self.attrs.iter().all(|condition| match condition {
            AttrCondition::Exists(name) => data.attribute(name).is_some(),
            AttrCondition::Equals(name, value) => {
                data.attribute(name).as_deref() == Some(value.as_str())
            }
        });
        if !attrs_match {
            return false;
        }

        self.pseudo.iter().all(|pseudo| match pseudo {
            Pseudo::Checked => data.checked && data.is_checkable(),
            Pseudo::Disabled => data.attrs.contains_key("disabled"),
            Pseudo::Enabled => !data.attrs.contains_key("disabled"),
            Pseudo::Not(inner) => !inner.matches(tree, node),
        })
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.trim().chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Skip whitespace, reporting whether any was consumed
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(found) => Err(SelectorError::Unexpected {
                found,
                offset: self.pos - 1,
            }),
            None => Err(SelectorError::UnexpectedEnd { expected }),
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(SelectorError::Unexpected {
                    found,
                    offset: self.pos,
                }),
                None => Err(SelectorError::Empty),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attr_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                while let Some(c) = self.peek().filter(|&c| c != quote) {
                    self.pos += 1;
                    // A backslash takes the next character literally
                    if c == '\\' {
                        match self.bump() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(SelectorError::UnexpectedEnd { expected: quote }),
                        }
                    } else {
                        value.push(c);
                    }
                }
                self.expect(quote)?;
                Ok(value)
            }
            _ => self.ident(),
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_ws();
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;

        loop {
            parts.push((combinator, self.compound()?));
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinator = Combinator::Child;
                }
                Some(_) if had_ws => combinator = Combinator::Descendant,
                Some(found) => {
                    return Err(SelectorError::Unexpected {
                        found,
                        offset: self.pos,
                    })
                }
            }
        }

        Ok(Complex(parts))
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if c.is_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    self.skip_ws();
                    let name = self.ident()?;
                    self.skip_ws();
                    if self.peek() == Some('=') {
                        self.bump();
                        self.skip_ws();
                        let value = self.attr_value()?;
                        self.skip_ws();
                        compound.attrs.push(AttrCondition::Equals(name, value));
                    } else {
                        compound.attrs.push(AttrCondition::Exists(name));
                    }
                    self.expect(']')?;
                }
                Some(':') => {
                    self.bump();
                    let name = self.ident()?.to_ascii_lowercase();
                    let pseudo = match name.as_str() {
                        "checked" => Pseudo::Checked,
                        "disabled" => Pseudo::Disabled,
                        "enabled" => Pseudo::Enabled,
                        "not" => {
                            self.expect('(')?;
                            self.skip_ws();
                            let inner = self.compound()?;
                            self.skip_ws();
                            self.expect(')')?;
                            Pseudo::Not(Box::new(inner))
                        }
                        _ => return Err(SelectorError::UnsupportedPseudo(name)),
                    };
                    compound.pseudo.push(pseudo);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(SelectorError::Unexpected {
                    found,
                    offset: self.pos,
                }),
                None => Err(SelectorError::Empty),
            };
        }

        Ok(compound)
    }
}
