//! Opaque causation token
//!
//! Callers of `set`/`add`/`remove` may attach a `Meta` token; the core passes
//! it through every change event unchanged and never interprets it. Typical
//! use is distinguishing user-driven from programmatic mutations.

use std::fmt;
use std::rc::Rc;

/// Opaque, cheap-to-clone causation tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meta(Rc<str>);

impl Meta {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Meta(Rc::from(tag.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
