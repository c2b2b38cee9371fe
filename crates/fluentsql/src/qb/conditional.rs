//! Conditional chaining: `if_` / `else_if` / `else_` / `end_if`.
//!
//! Each builder owns a [`BranchStack`]. While the innermost frame is inactive,
//! every mutating builder method is a no-op that hands the builder back
//! unchanged, so a single call chain can express optional clauses:
//!
//! ```ignore
//! let qb = qb::select()
//!     .from("book")
//!     .if_(filters.author.is_some())
//!         .eq("author_id", filters.author)
//!     .else_()?
//!         .is_null("author_id")
//!     .end_if()?;
//! ```

use crate::error::{QbError, QbResult};

/// One `if_` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// This level's own condition for the current arm.
    pub state: bool,
    /// Some arm at this level has already fired.
    pub was_true: bool,
    /// Every enclosing level was active when this one was opened.
    pub parent_state: bool,
}

impl Frame {
    fn new(cond: bool, parent_state: bool) -> Self {
        Self {
            state: cond,
            was_true: cond,
            parent_state,
        }
    }

    fn set_state(&mut self, cond: bool) {
        self.state = cond;
        self.was_true |= cond;
    }

    pub fn is_active(&self) -> bool {
        self.state && self.parent_state
    }
}

/// Which side of a conditional chain a builder is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Calls are applied.
    Active,
    /// Calls are swallowed until the `end_if` closing `depth`.
    Inactive { depth: usize },
}

/// Stack of open `if_` levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchStack {
    frames: Vec<Frame>,
}

impl BranchStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// True outside any `if_` or when the innermost arm is live.
    pub fn is_active(&self) -> bool {
        self.frames.last().is_none_or(Frame::is_active)
    }

    pub fn branch(&self) -> Branch {
        if self.is_active() {
            Branch::Active
        } else {
            Branch::Inactive {
                depth: self.frames.len(),
            }
        }
    }

    /// Number of open `if_` levels.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Open a level.
    pub fn push(&mut self, cond: bool) {
        let parent_state = self.is_active();
        self.frames.push(Frame::new(cond, parent_state));
    }

    /// Switch to an `else_if` arm: live only if no earlier arm fired.
    pub fn else_if(&mut self, cond: bool) -> QbResult<()> {
        let frame = self.top_mut("else_if")?;
        let state = !frame.was_true && cond;
        frame.set_state(state);
        Ok(())
    }

    /// Switch to the `else_` arm.
    pub fn else_(&mut self) -> QbResult<()> {
        let frame = self.top_mut("else_")?;
        let state = !frame.state && !frame.was_true;
        frame.set_state(state);
        Ok(())
    }

    /// Close the innermost level.
    pub fn pop(&mut self) -> QbResult<()> {
        match self.frames.pop() {
            Some(_) => Ok(()),
            None => Err(QbError::fluent_state("end_if() must be called after if_()")),
        }
    }

    fn top_mut(&mut self, method: &str) -> QbResult<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| QbError::fluent_state(format!("{method}() must be called after if_()")))
    }
}

/// Conditional chaining for builders that own a [`BranchStack`].
pub trait Branching: Sized {
    fn branches(&self) -> &BranchStack;

    fn branches_mut(&mut self) -> &mut BranchStack;

    /// Start a conditional block.
    fn if_(mut self, cond: bool) -> Self {
        self.branches_mut().push(cond);
        self
    }

    /// Alternative arm, taken if no earlier arm of this block was.
    fn else_if(mut self, cond: bool) -> QbResult<Self> {
        self.branches_mut().else_if(cond)?;
        Ok(self)
    }

    /// Final arm, taken if no earlier arm of this block was.
    fn else_(mut self) -> QbResult<Self> {
        self.branches_mut().else_()?;
        Ok(self)
    }

    /// Close the innermost conditional block.
    fn end_if(mut self) -> QbResult<Self> {
        self.branches_mut().pop()?;
        Ok(self)
    }

    fn branch(&self) -> Branch {
        self.branches().branch()
    }

    /// Whether mutating calls are currently applied.
    fn is_active(&self) -> bool {
        self.branches().is_active()
    }
}
