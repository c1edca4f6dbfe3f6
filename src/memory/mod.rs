//! Memory model of a recorded step
//!
//! - [`value`]: slot/field values ([`value::Primitive`] literals and heap references)
//! - [`stack`]: call-stack frames and named slots
//! - [`heap`]: the per-step heap map and its tagged objects
//!
//! # Identity
//!
//! Heap objects are addressed by [`value::HeapId`]. Ids are unique within a
//! step and stable across steps for the same logical object, which is what
//! lets two slots alias the same object.

pub mod heap;
pub mod stack;
pub mod value;
