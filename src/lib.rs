//! # Introduction
//!
//! tracevis renders a recorded program-execution trace as a steppable
//! diagram of stack frames, heap objects and the references between them.
//! A trace is a list of steps, each carrying the call stack and a heap
//! snapshot at that point of the run; the visualizer keeps one step current
//! and redraws the diagram whenever it changes.
//!
//! ## Rendering pipeline
//!
//! ```text
//! Trace JSON → Decode → Trace → resolve() → RenderGraph → Panes → Connectors
//! ```
//!
//! 1. [`parser`] reads a trace from a file, a base64 data-URI or a JSON value
//!    and decodes it into typed [`snapshot::Step`]s.
//! 2. [`memory`] is the typed memory model: [`memory::value::Value`]s held in
//!    [`memory::stack::Frame`]s and a [`memory::heap::Heap`].
//! 3. [`graph`] resolves one step into a [`graph::RenderGraph`]: which heap
//!    boxes are drawn, where they sit and which edges join them.
//! 4. [`controller`] owns the current step index and bounds navigation.
//! 5. [`ui`] paints the graph into a [`ui::Container`] and draws connectors
//!    from the positions the paint pass recorded.
//! 6. [`visualizer`] ties these together behind the [`Visualizer`] handle.
//!
//! Traces can also be produced on demand by an external tracer through
//! [`backend::CommandBackend`].
//!
//! ## Example
//!
//! ```no_run
//! use tracevis::{Container, Options, Visualizer};
//!
//! let container = Container::new("demo", 100, 30);
//! let mut viz = Visualizer::new(container, "trace.json", Options::default())?;
//! viz.next()?;
//! println!("{}", viz.container().to_text());
//! # Ok::<(), tracevis::VisualizerError>(())
//! ```

pub mod backend;
pub mod config;
pub mod controller;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod ui;
pub mod visualizer;

pub use config::{Lang, Options};
pub use errors::VisualizerError;
pub use snapshot::Trace;
pub use ui::Container;
pub use visualizer::Visualizer;
