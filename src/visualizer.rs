//! The visualizer handle
//!
//! A [`Visualizer`] ties a [`Trace`] to a [`Container`]: it owns the step
//! controller, the render graph of the current step and the connectors drawn
//! over it. Hosts create one per container and pass it around explicitly.
//!
//! Every navigation call runs the same pipeline for the new step:
//!
//! ```text
//! StepController → resolve() → paint panes → ConnectorLayer::draw
//! ```
//!
//! Resizing goes through [`Visualizer::container_mut`] and is followed by
//! [`Visualizer::redraw_connectors`], which repaints when the size changed and
//! always re-reads element positions before drawing connectors.

use std::borrow::Cow;

use crate::config::Options;
use crate::controller::{RenderTicket, StepController};
use crate::errors::{Result, VisualizerError};
use crate::graph::{resolve, RenderGraph};
use crate::parser::ingest::TraceSource;
use crate::snapshot::{Step, Trace};
use crate::ui::connectors::ConnectorLayer;
use crate::ui::container::Container;
use crate::ui::panes::{self, Scene};
use tracing::{debug, info};

/// Message used when a failed run carries no exception text
pub const UNKNOWN_ERROR: &str = "Unknown error.";

pub struct Visualizer {
    trace: Trace,
    options: Options,
    controller: StepController,
    container: Container,
    graph: RenderGraph,
    connectors: ConnectorLayer,
    notice: Option<String>,
    playing: bool,
}

impl Visualizer {
    /// Load a trace from `source` and render its initial step into `container`
    pub fn new(
        container: Container,
        source: impl Into<TraceSource>,
        options: Options,
    ) -> Result<Self> {
        let trace = Trace::load(source)?;
        Self::from_trace(container, trace, options)
    }

    /// Render the initial step of an already loaded trace
    ///
    /// A failed run with a single step has nothing to show and is reported as
    /// [`VisualizerError::UncaughtExecutionFailure`]. In longer failed runs the
    /// failing step itself is not navigable; see [`Visualizer::failure`].
    pub fn from_trace(container: Container, trace: Trace, options: Options) -> Result<Self> {
        options.validate()?;
        let navigable = navigable_steps(&trace)?;
        let controller = StepController::new(navigable, &options);

        let mut visualizer = Visualizer {
            graph: RenderGraph::empty(controller.current()),
            trace,
            options,
            controller,
            container,
            connectors: ConnectorLayer::new(),
            notice: None,
            playing: false,
        };
        let ticket = visualizer.controller.ticket();
        visualizer.render(ticket)?;

        info!(
            container = visualizer.container.id(),
            steps = visualizer.trace.len(),
            start = visualizer.controller.current(),
            failed = visualizer.trace.is_failed(),
            "visualizer ready"
        );
        Ok(visualizer)
    }

    /// Swap in a new trace, keeping container and options
    ///
    /// On error nothing changes.
    pub fn reload(&mut self, trace: Trace) -> Result<()> {
        let navigable = navigable_steps(&trace)?;
        let controller = StepController::new(navigable, &self.options);
        let step = Self::step_of(&trace, controller.current())?;
        let graph = resolve(controller.current(), step, &self.options, None)?;

        self.trace = trace;
        self.controller = controller;
        self.graph = graph;
        self.paint();
        self.connectors.draw(&self.graph.edges, &mut self.container);
        info!(steps = self.trace.len(), "trace reloaded");
        Ok(())
    }

    fn step_of(trace: &Trace, index: usize) -> Result<&Step> {
        trace.get(index).ok_or(VisualizerError::OutOfRange {
            requested: index as i64,
            len: trace.len(),
        })
    }

    /// Resolve, paint and draw the step named by `ticket` unless it went stale
    fn render(&mut self, ticket: RenderTicket) -> Result<()> {
        let step = Self::step_of(&self.trace, ticket.step)?;
        let graph = resolve(ticket.step, step, &self.options, Some(&self.graph))?;

        if !self.controller.is_current(ticket) {
            debug!(step = ticket.step, "dropping stale render");
            return Ok(());
        }
        self.graph = graph;
        self.paint();
        self.connectors.draw(&self.graph.edges, &mut self.container);
        Ok(())
    }

    fn paint(&mut self) {
        let scene = Scene {
            trace: &self.trace,
            graph: &self.graph,
            options: &self.options,
            step: self.controller.current(),
            navigable: self.controller.len(),
            failure: failure_of(&self.trace),
            notice: self.notice.as_deref(),
            playing: self.playing,
        };
        panes::paint(&mut self.container, &scene);
    }

    fn navigate(
        &mut self,
        transition: impl FnOnce(&mut StepController) -> Result<RenderTicket>,
    ) -> Result<usize> {
        let saved = self.controller.clone();
        let ticket = transition(&mut self.controller)?;
        if let Err(e) = self.render(ticket) {
            self.controller = saved;
            return Err(e);
        }
        Ok(self.controller.current())
    }

    pub fn next(&mut self) -> Result<usize> {
        self.navigate(StepController::next)
    }

    pub fn prev(&mut self) -> Result<usize> {
        self.navigate(StepController::prev)
    }

    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        self.navigate(|controller| controller.jump_to(index))
    }

    pub fn jump_to_start(&mut self) -> Result<usize> {
        self.navigate(StepController::jump_to_start)
    }

    pub fn jump_to_end(&mut self) -> Result<usize> {
        self.navigate(StepController::jump_to_end)
    }

    /// Bring connectors up to date with the container
    ///
    /// Repaints first when the container was resized since the last paint.
    /// Safe to call at any time and as often as needed.
    pub fn redraw_connectors(&mut self) {
        if self.container.is_stale() {
            debug!(
                width = self.container.width(),
                height = self.container.height(),
                "relayout before redraw"
            );
            self.paint();
        }
        self.connectors.redraw(&mut self.container);
    }

    /// Set or clear the notice shown in the status bar, repainting the current step
    pub fn set_notice(&mut self, notice: Option<String>) {
        if self.notice == notice {
            return;
        }
        self.notice = notice;
        self.paint();
        self.connectors.redraw(&mut self.container);
    }

    /// Mark autoplay state for the status bar
    pub fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.paint();
            self.connectors.redraw(&mut self.container);
        }
    }

    pub fn current_step(&self) -> usize {
        self.controller.current()
    }

    /// Number of navigable steps
    pub fn step_count(&self) -> usize {
        self.controller.len()
    }

    pub fn current(&self) -> &Step {
        // The controller never points past the trace
        &self.trace.steps()[self.controller.current()]
    }

    pub fn is_at_end(&self) -> bool {
        self.controller.is_at_end()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn render_graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn connectors(&self) -> &ConnectorLayer {
        &self.connectors
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resize handle; positions are stale until [`Visualizer::redraw_connectors`]
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Output shown for the current step
    pub fn output(&self) -> Cow<'_, str> {
        self.trace.visible_output(
            self.controller.current(),
            self.controller.len(),
            self.options.cumulative_mode,
        )
    }

    /// Why the run failed, for traces ending in an uncaught exception
    pub fn failure(&self) -> Option<&str> {
        failure_of(&self.trace)
    }

    /// Rows the container needs to show the current step unclipped at its width
    pub fn content_height(&self) -> u16 {
        let scene = Scene {
            trace: &self.trace,
            graph: &self.graph,
            options: &self.options,
            step: self.controller.current(),
            navigable: self.controller.len(),
            failure: failure_of(&self.trace),
            notice: self.notice.as_deref(),
            playing: self.playing,
        };
        panes::content_height(&scene, self.container.width())
    }
}

fn failure_of(trace: &Trace) -> Option<&str> {
    if !trace.is_failed() {
        return None;
    }
    Some(trace.failure_message().unwrap_or(UNKNOWN_ERROR))
}

/// Steps a user can visit; the failing step of a failed run is excluded
fn navigable_steps(trace: &Trace) -> Result<usize> {
    if !trace.is_failed() {
        return Ok(trace.len());
    }
    if trace.len() == 1 {
        let message = trace.failure_message().unwrap_or(UNKNOWN_ERROR);
        return Err(VisualizerError::UncaughtExecutionFailure {
            message: message.to_string(),
        });
    }
    Ok(trace.len() - 1)
}
