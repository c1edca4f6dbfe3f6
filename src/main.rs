// tracevis: step through recorded program execution traces in the terminal

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use tracevis::backend::{BackendRequest, CommandBackend, ExecutionBackend};
use tracevis::config::{Lang, Options};
use tracevis::errors::VisualizerError;
use tracevis::logging::{init_logging, LogTarget};
use tracevis::ui::container::DEFAULT_SIZE;
use tracevis::ui::App;
use tracevis::{Container, Trace, Visualizer};

#[derive(Parser, Debug)]
#[command(name = "tracevis")]
#[command(about = "Step through a program execution trace as a stack and heap diagram", version)]
struct Cli {
    /// Trace to show: a file path, `file://` URL, base64 `data:` URI, inline JSON, or `-` for stdin
    trace: Option<String>,

    /// Options file (.json or .toml); flags below override it
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Language the trace was recorded from (java, py2, py3, js, ts, c, cpp, ruby)
    #[arg(long)]
    lang: Option<String>,

    /// Step shown first
    #[arg(long, value_name = "N")]
    starting_instruction: Option<usize>,

    #[arg(long)]
    jump_to_end: bool,

    #[arg(long)]
    hide_code: bool,

    /// Draw every heap object as its own box
    #[arg(long)]
    disable_heap_nesting: bool,

    #[arg(long)]
    vertical_stack: bool,

    /// Draw connectors from functions to their parent frames
    #[arg(long)]
    draw_parent_pointers: bool,

    /// Label references with ids instead of arrows
    #[arg(long)]
    textual_memory_labels: bool,

    /// Box strings and boxed primitives
    #[arg(long)]
    heap_primitives: bool,

    #[arg(long)]
    show_only_outputs: bool,

    /// Show all output so far instead of only the current step's
    #[arg(long)]
    cumulative: bool,

    /// Hide the status bar
    #[arg(long)]
    embedded: bool,

    #[arg(long)]
    highlight_lines: bool,

    /// Omit type labels on heap boxes
    #[arg(long)]
    no_types: bool,

    /// Package prefix stripped from type labels; repeatable
    #[arg(long, value_name = "PREFIX")]
    strip_type_prefix: Vec<String>,

    /// Print the selected step as text and exit
    #[arg(long)]
    print: bool,

    /// Step printed with --print (defaults to the initial step)
    #[arg(long, value_name = "N", requires = "print")]
    step: Option<usize>,

    /// Width used by --print
    #[arg(long)]
    width: Option<u16>,

    /// Height used by --print (defaults to the content height)
    #[arg(long)]
    height: Option<u16>,

    /// Program source passed to the tracer
    #[arg(long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// Input line fed to the traced program; repeatable
    #[arg(long, value_name = "LINE")]
    input: Vec<String>,

    /// Seconds before the tracer is killed
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log to this file instead of the default
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Tracer command producing a trace from --source, e.g. `-- python3 tracer.py`
    #[arg(last = true, value_name = "CMD")]
    tracer: Vec<String>,
}

impl Cli {
    fn log_target(&self) -> Result<LogTarget, VisualizerError> {
        match (&self.log_file, self.print) {
            (Some(path), _) => Ok(LogTarget::File(path.clone())),
            (None, true) => Ok(LogTarget::Stderr),
            // The terminal UI owns stderr's screen
            (None, false) => LogTarget::default_file(),
        }
    }

    fn resolve_options(&self) -> Result<Options, VisualizerError> {
        let mut options = match &self.options {
            Some(path) => Options::from_file(path)?,
            None => Options::default(),
        };

        if let Some(lang) = &self.lang {
            options.lang = parse_lang(lang)?;
        }
        if let Some(step) = self.starting_instruction {
            options.starting_instruction = step;
        }
        options.jump_to_end |= self.jump_to_end;
        options.hide_code |= self.hide_code;
        options.disable_heap_nesting |= self.disable_heap_nesting;
        options.vertical_stack |= self.vertical_stack;
        options.draw_parent_pointers |= self.draw_parent_pointers;
        options.textual_memory_labels |= self.textual_memory_labels;
        options.heap_primitives |= self.heap_primitives;
        options.show_only_outputs |= self.show_only_outputs;
        options.cumulative_mode |= self.cumulative;
        options.embedded_mode |= self.embedded;
        options.highlight_lines |= self.highlight_lines;
        if self.no_types {
            options.include_types = false;
        }
        options
            .strip_type_prefixes
            .extend(self.strip_type_prefix.iter().cloned());

        options.validate()?;
        Ok(options)
    }

    fn tracer(&self, options: &Options) -> Result<Option<(CommandBackend, BackendRequest)>, VisualizerError> {
        if self.tracer.is_empty() {
            return Ok(None);
        }
        let path = self.source.as_ref().ok_or_else(|| VisualizerError::InvalidOption {
            reason: "a tracer command needs --source".to_string(),
        })?;
        let source = fs::read_to_string(path)?;

        let mut backend = CommandBackend::from_command_line(&self.tracer)?;
        if let Some(secs) = self.timeout {
            backend = backend.timeout(Duration::from_secs(secs));
        }
        let request = BackendRequest::new(source, options).with_raw_inputs(self.input.clone());
        Ok(Some((backend, request)))
    }
}

fn parse_lang(name: &str) -> Result<Lang, VisualizerError> {
    serde_json::from_value(serde_json::Value::String(name.to_lowercase())).map_err(|_| {
        VisualizerError::InvalidOption {
            reason: format!("unknown language `{}`", name),
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(cli.verbose, &cli.log_target()?)?;

    let options = cli.resolve_options()?;
    let tracer = cli.tracer(&options)?;

    let trace = match (&cli.trace, &tracer) {
        (Some(arg), _) => Trace::load(arg.as_str())?,
        (None, Some((backend, request))) => backend.execute(request)?,
        (None, None) => {
            return Err("no trace given; pass a trace or `--source FILE -- <tracer command>`".into())
        }
    };
    info!(steps = trace.len(), "trace loaded");

    if cli.print {
        return print_step(&cli, trace, options);
    }

    let visualizer = Visualizer::from_trace(Container::fit_to_host("tracevis"), trace, options)?;
    let mut app = App::new(visualizer);
    if let Some((backend, request)) = tracer {
        app = app.with_rerun(Box::new(backend), request);
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn print_step(cli: &Cli, trace: Trace, options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let width = cli.width.unwrap_or(DEFAULT_SIZE.0);
    let height = cli.height.unwrap_or(DEFAULT_SIZE.1);
    let mut visualizer = Visualizer::from_trace(Container::new("tracevis", width, height), trace, options)?;

    if let Some(step) = cli.step {
        visualizer.jump_to(step)?;
    }
    if cli.height.is_none() {
        let height = visualizer.content_height();
        visualizer.container_mut().resize(width, height);
        visualizer.redraw_connectors();
    }

    println!("{}", visualizer.container().to_text());
    Ok(())
}
