//! Terminal rendering built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into layers:
//!
//! - **[`container`]** the host-sized cell surface a visualizer paints into
//! - **[`layout`]** rectangles of every painted element, keyed for lookup
//! - **[`panes`]** stateless paint functions for the stack, heap, code, output
//!   and status regions
//! - **[`connectors`]** arrows drawn over the painted panes from registered
//!   positions
//! - **[`app`]** the interactive event loop around a [`Visualizer`]
//! - **[`theme`]** centralized color palette used by all panes
//!
//! [`Visualizer`]: crate::visualizer::Visualizer

pub mod app;
pub mod connectors;
pub mod container;
pub mod layout;
pub mod panes;
pub mod theme;

pub use app::App;
pub use container::Container;
