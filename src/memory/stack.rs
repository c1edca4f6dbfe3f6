//! Call stack frames and their slots

use super::value::Value;

/// Slot name the tracers use for a frame's pending return value
pub const RETURN_SLOT: &str = "__return__";

/// How the return slot is titled in a frame box
pub const RETURN_LABEL: &str = "Return value";

/// A named slot inside a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub value: Value,
}

impl Slot {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Slot {
            name: name.into(),
            value,
        }
    }

    /// Name as shown in the frame box
    pub fn display_name(&self) -> &str {
        if self.name == RETURN_SLOT {
            RETURN_LABEL
        } else {
            &self.name
        }
    }
}

/// One frame of the call stack (or the global frame)
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub function_name: String,
    pub slots: Vec<Slot>,
    pub is_global: bool,
    pub frame_id: Option<u64>,
    pub is_highlighted: bool,
}

impl Frame {
    pub fn new(function_name: impl Into<String>, slots: Vec<Slot>) -> Self {
        Frame {
            function_name: function_name.into(),
            slots,
            is_global: false,
            frame_id: None,
            is_highlighted: false,
        }
    }

    pub fn global(slots: Vec<Slot>) -> Self {
        Frame {
            function_name: String::from("Global frame"),
            slots,
            is_global: true,
            frame_id: None,
            is_highlighted: false,
        }
    }

    pub fn with_frame_id(mut self, frame_id: u64) -> Self {
        self.frame_id = Some(frame_id);
        self
    }
}
