//! Continuation state shared by the block and sequence processors

use super::errors::ActionError;

/// A redirected continuation: visit `targets` in order, then stop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Goto {
    targets: Vec<usize>,
    index: usize,
}

impl Goto {
    pub fn new(targets: Vec<usize>) -> Self {
        Self { targets, index: 0 }
    }

    fn next(&mut self) -> Option<usize> {
        let target = self.targets.get(self.index).copied()?;
        self.index += 1;
        Some(target)
    }
}

/// Picks the next position to run, either in declared order or from a goto list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    next: usize,
    len: usize,
    goto: Option<Goto>,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: 0,
            len,
            goto: None,
        }
    }

    /// Next position, or `None` when there is no more work
    pub fn advance(&mut self) -> Option<usize> {
        if let Some(goto) = &mut self.goto {
            return goto.next();
        }

        if self.next < self.len {
            let position = self.next;
            self.next += 1;
            Some(position)
        } else {
            None
        }
    }

    /// Replace the continuation with `targets`
    ///
    /// Every target must be a valid position; an empty list ends the run.
    pub fn redirect(&mut self, targets: Vec<usize>) -> Result<(), ActionError> {
        if let Some(&target) = targets.iter().find(|&&t| t >= self.len) {
            return Err(ActionError::InvalidBranchTarget {
                target,
                len: self.len,
            });
        }
        self.goto = Some(Goto::new(targets));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
