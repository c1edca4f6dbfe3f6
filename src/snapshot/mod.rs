// Recorded execution steps and the immutable trace

use std::borrow::Cow;

use crate::errors::{Result, VisualizerError};
use crate::memory::{
    heap::Heap,
    stack::Frame,
    value::HeapId,
};
use crate::parser::ingest::TraceSource;

/// What the runtime was doing when a step was recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    StepLine,
    Call,
    Return,
    Exception,
    UncaughtException,
    Other(String),
}

impl EventKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "step_line" => EventKind::StepLine,
            "call" => EventKind::Call,
            "return" => EventKind::Return,
            "exception" => EventKind::Exception,
            "uncaught_exception" => EventKind::UncaughtException,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::StepLine => "step_line",
            EventKind::Call => "call",
            EventKind::Return => "return",
            EventKind::Exception => "exception",
            EventKind::UncaughtException => "uncaught_exception",
            EventKind::Other(s) => s,
        }
    }
}

/// One point in execution time
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub line: Option<u32>,
    pub event: EventKind,
    pub func_name: Option<String>,
    /// Global frame first (when present), then call frames outer-to-inner
    pub stack: Vec<Frame>,
    pub heap: Heap,
    /// Program output accumulated up to and including this step
    pub stdout: String,
    pub exception_msg: Option<String>,
}

impl Step {
    pub fn new(event: EventKind, stack: Vec<Frame>, heap: Heap) -> Self {
        Step {
            line: None,
            event,
            func_name: None,
            stack,
            heap,
            stdout: String::new(),
            exception_msg: None,
        }
    }

    /// First reference (in frame order, then heap order) with no object in this step's heap
    pub fn dangling_reference(&self) -> Option<HeapId> {
        let from_frames = self
            .stack
            .iter()
            .flat_map(|frame| frame.slots.iter())
            .filter_map(|slot| slot.value.as_reference());

        let mut ids: Vec<HeapId> = self
            .heap
            .iter()
            .flat_map(|(_, object)| object.references())
            .collect();
        ids.sort();

        from_frames
            .chain(ids)
            .find(|id| !self.heap.contains(*id))
    }

    pub fn is_uncaught_exception(&self) -> bool {
        self.event == EventKind::UncaughtException
    }
}

/// An ordered, non-empty recording of execution steps
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    steps: Vec<Step>,
    code: Option<String>,
    failed: bool,
}

impl Trace {
    /// Build a trace from decoded steps
    ///
    /// Fails on an empty step list or a dangling reference. A trace whose final
    /// step is an `uncaught_exception` is valid but tagged as a failed run.
    pub fn new(steps: Vec<Step>, code: Option<String>) -> Result<Self> {
        if steps.is_empty() {
            return Err(VisualizerError::malformed("trace has no steps"));
        }

        for (index, step) in steps.iter().enumerate() {
            if let Some(id) = step.dangling_reference() {
                return Err(VisualizerError::malformed(format!(
                    "step {}: reference to heap object {} has no matching object",
                    index, id
                )));
            }
        }

        let failed = steps.last().is_some_and(Step::is_uncaught_exception);
        Ok(Trace {
            steps,
            code,
            failed,
        })
    }

    /// Ingest and decode a trace from any supported source
    pub fn load(source: impl Into<TraceSource>) -> Result<Self> {
        let value = source.into().into_value()?;
        crate::parser::load(value)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: an empty trace never constructs
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Whether the final step records an uncaught exception
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Message explaining a failed run
    ///
    /// The final step's message, falling back to the latest earlier step that
    /// carries one.
    pub fn failure_message(&self) -> Option<&str> {
        if !self.failed {
            return None;
        }
        self.steps
            .iter()
            .rev()
            .find_map(|step| step.exception_msg.as_deref())
    }

    /// Program output to show at `index`
    ///
    /// In cumulative mode this is everything printed so far; otherwise only
    /// what this step added relative to the previous one.
    pub fn output_at(&self, index: usize, cumulative: bool) -> &str {
        let Some(step) = self.steps.get(index) else {
            return "";
        };
        if cumulative || index == 0 {
            return &step.stdout;
        }
        let previous = &self.steps[index - 1].stdout;
        step.stdout
            .strip_prefix(previous.as_str())
            .unwrap_or(&step.stdout)
    }

    /// Output to show at `index` when only the first `navigable` steps can be visited
    ///
    /// On the last navigable step this also carries what the steps past it
    /// printed before the run failed.
    pub fn visible_output(&self, index: usize, navigable: usize, cumulative: bool) -> Cow<'_, str> {
        let shown = self.output_at(index, cumulative);
        if index + 1 != navigable {
            return Cow::Borrowed(shown);
        }
        let tail: String = (navigable..self.steps.len())
            .map(|later| self.output_at(later, false))
            .collect();
        if tail.is_empty() {
            Cow::Borrowed(shown)
        } else {
            Cow::Owned(format!("{}{}", shown, tail))
        }
    }
}
