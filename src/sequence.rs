use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    diagnostics::{fault, DiagnosticKind, Result},
    value::Value,
};

/// A generic ordered container of values. The backing store is shared
/// between clones, so mutating natives (`append`, `insert`, `set`,
/// `remove`) are visible through every binding that holds the same
/// sequence.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    items: Rc<RefCell<Vec<Value>>>,
}

impl Sequence {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    fn check_bounds(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(fault(
                DiagnosticKind::IndexOutOfRange,
                format!("index {index} is outside a sequence of length {len}"),
            ));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.check_bounds(index)?;
        Ok(self.items.borrow()[index].clone())
    }

    pub fn set(&self, index: usize, value: Value) -> Result<()> {
        self.check_bounds(index)?;
        self.items.borrow_mut()[index] = value;
        Ok(())
    }

    pub fn append(&self, value: Value) {
        self.items.borrow_mut().push(value);
    }

    pub fn insert(&self, index: usize, value: Value) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(fault(
                DiagnosticKind::IndexOutOfRange,
                format!("cannot insert at {index} in a sequence of length {len}"),
            ));
        }
        self.items.borrow_mut().insert(index, value);
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Result<Value> {
        self.check_bounds(index)?;
        Ok(self.items.borrow_mut().remove(index))
    }

    pub fn index_of(&self, needle: &Value) -> Option<usize> {
        self.items
            .borrow()
            .iter()
            .position(|item| item.loose_eq(needle))
    }

    pub fn contains(&self, needle: &Value) -> bool {
        self.index_of(needle).is_some()
    }

    /// End-inclusive slice; both bounds must fall inside the sequence.
    pub fn slice(&self, start: usize, end: usize) -> Result<Sequence> {
        self.check_bounds(start)?;
        self.check_bounds(end)?;
        if end < start {
            return Err(fault(
                DiagnosticKind::IndexOutOfRange,
                format!("slice end {end} precedes start {start}"),
            ));
        }
        Ok(Sequence::new(self.items.borrow()[start..=end].to_vec()))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, item) in self.items.borrow().iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, "]")
    }
}

/// A sequence specialized to single characters, with a derived
/// whole-string view. Token interpolation over the rendered string lives
/// in the interpreter, which owns the environment the tokens resolve
/// against.
#[derive(Debug, Clone, Default)]
pub struct Text {
    chars: Rc<RefCell<Vec<char>>>,
}

impl Text {
    pub fn new(text: &str) -> Self {
        Self {
            chars: Rc::new(RefCell::new(text.chars().collect())),
        }
    }

    pub fn from_char(ch: char) -> Self {
        Self {
            chars: Rc::new(RefCell::new(vec![ch])),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.borrow().is_empty()
    }

    pub fn as_string(&self) -> String {
        self.chars.borrow().iter().collect()
    }

    fn check_bounds(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(fault(
                DiagnosticKind::IndexOutOfRange,
                format!("index {index} is outside a text of length {len}"),
            ));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<char> {
        self.check_bounds(index)?;
        Ok(self.chars.borrow()[index])
    }

    pub fn set(&self, index: usize, ch: char) -> Result<()> {
        self.check_bounds(index)?;
        self.chars.borrow_mut()[index] = ch;
        Ok(())
    }

    pub fn append(&self, other: &Text) {
        let incoming: Vec<char> = other.chars.borrow().clone();
        self.chars.borrow_mut().extend(incoming);
    }

    pub fn insert(&self, index: usize, ch: char) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(fault(
                DiagnosticKind::IndexOutOfRange,
                format!("cannot insert at {index} in a text of length {len}"),
            ));
        }
        self.chars.borrow_mut().insert(index, ch);
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Result<char> {
        self.check_bounds(index)?;
        Ok(self.chars.borrow_mut().remove(index))
    }

    pub fn reverse(&self) -> Text {
        let mut chars: Vec<char> = self.chars.borrow().clone();
        chars.reverse();
        Text {
            chars: Rc::new(RefCell::new(chars)),
        }
    }

    pub fn to_upper(&self) -> Text {
        Text::new(&self.as_string().to_uppercase())
    }

    pub fn to_lower(&self) -> Text {
        Text::new(&self.as_string().to_lowercase())
    }

    pub fn trim(&self) -> Text {
        Text::new(self.as_string().trim())
    }

    /// Character index of the first occurrence of `needle`.
    pub fn find(&self, needle: &Text) -> Option<usize> {
        let haystack = self.as_string();
        let needle = needle.as_string();
        haystack
            .find(&needle)
            .map(|byte_idx| haystack[..byte_idx].chars().count())
    }

    pub fn contains(&self, needle: &Text) -> bool {
        self.find(needle).is_some()
    }

    pub fn replace(&self, from: &Text, to: &Text) -> Text {
        Text::new(&self.as_string().replace(&from.as_string(), &to.as_string()))
    }

    pub fn pad_start(&self, width: usize, filler: char) -> Text {
        let mut chars = self.chars.borrow().clone();
        while chars.len() < width {
            chars.insert(0, filler);
        }
        Text {
            chars: Rc::new(RefCell::new(chars)),
        }
    }

    pub fn pad_end(&self, width: usize, filler: char) -> Text {
        let mut chars = self.chars.borrow().clone();
        while chars.len() < width {
            chars.push(filler);
        }
        Text {
            chars: Rc::new(RefCell::new(chars)),
        }
    }

    pub fn truncate(&self, width: usize) -> Text {
        let chars = self.chars.borrow();
        Text {
            chars: Rc::new(RefCell::new(
                chars.iter().take(width).copied().collect(),
            )),
        }
    }

    /// End-inclusive substring, mirroring `Sequence::slice`.
    pub fn substring(&self, start: usize, end: usize) -> Result<Text> {
        self.check_bounds(start)?;
        self.check_bounds(end)?;
        if end < start {
            return Err(fault(
                DiagnosticKind::IndexOutOfRange,
                format!("substring end {end} precedes start {start}"),
            ));
        }
        Ok(Text {
            chars: Rc::new(RefCell::new(self.chars.borrow()[start..=end].to_vec())),
        })
    }

    pub fn split(&self, separator: &Text) -> Vec<Text> {
        let separator = separator.as_string();
        if separator.is_empty() {
            return self
                .chars
                .borrow()
                .iter()
                .map(|ch| Text::from_char(*ch))
                .collect();
        }
        self.as_string()
            .split(&separator)
            .map(Text::new)
            .collect()
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
