//! Current-step bookkeeping
//!
//! [`StepController`] owns the step index shown by the visualizer. Every
//! successful transition bumps a generation counter and hands back a
//! [`RenderTicket`]; a render is committed only while its ticket is still
//! current, so when transitions pile up the latest one wins.

use crate::config::Options;
use crate::errors::{Result, VisualizerError};
use tracing::debug;

/// Proof that a render was requested for a given transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub step: usize,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct StepController {
    /// Number of navigable steps, always at least 1
    len: usize,
    current: usize,
    generation: u64,
}

impl StepController {
    /// Start a controller over `len` navigable steps
    ///
    /// `len` is clamped to 1 so the index invariant holds even for callers
    /// that pass an empty range.
    pub fn new(len: usize, options: &Options) -> Self {
        let len = len.max(1);
        StepController {
            len,
            current: Self::initial_step(len, options),
            generation: 0,
        }
    }

    /// Step shown first: the last one with `jumpToEnd`, otherwise
    /// `startingInstruction` when it is in range, otherwise 0
    pub fn initial_step(len: usize, options: &Options) -> usize {
        if options.jump_to_end {
            len.saturating_sub(1)
        } else if options.starting_instruction < len {
            options.starting_instruction
        } else {
            0
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; see [`StepController::new`]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_at_start(&self) -> bool {
        self.current == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.current + 1 == self.len
    }

    /// Ticket for the state as it is now
    pub fn ticket(&self) -> RenderTicket {
        RenderTicket {
            step: self.current,
            generation: self.generation,
        }
    }

    /// Whether no transition happened since `ticket` was issued
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        ticket.generation == self.generation && ticket.step == self.current
    }

    pub fn next(&mut self) -> Result<RenderTicket> {
        self.go(self.current as i64 + 1)
    }

    pub fn prev(&mut self) -> Result<RenderTicket> {
        self.go(self.current as i64 - 1)
    }

    pub fn jump_to(&mut self, index: usize) -> Result<RenderTicket> {
        self.go(index as i64)
    }

    pub fn jump_to_start(&mut self) -> Result<RenderTicket> {
        self.go(0)
    }

    pub fn jump_to_end(&mut self) -> Result<RenderTicket> {
        self.go(self.len as i64 - 1)
    }

    fn go(&mut self, requested: i64) -> Result<RenderTicket> {
        if requested < 0 || requested >= self.len as i64 {
            debug!(requested, len = self.len, "navigation out of range");
            return Err(VisualizerError::OutOfRange {
                requested,
                len: self.len,
            });
        }
        self.current = requested as usize;
        self.generation += 1;
        Ok(self.ticket())
    }
}
