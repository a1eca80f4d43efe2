mod config;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::{error, info};

use expander::{DEFAULT_MAX_DEPTH, ExpandError, Expander, Scope};

const SUBCOMMANDS: &[&str] = &["build", "render", "help"];

#[derive(Parser)]
#[command(name = "stitch", version, about = "Static-site template expander")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site: copy dependencies and expand every page
    Build(BuildArgs),

    /// Expand one page or markup string and print the result
    Render(RenderArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Site root; page, template, include and data paths are relative to it
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: stitch.toml in the site root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Page to build. Repeatable; replaces the configured pages.
    #[arg(long = "page")]
    pages: Vec<PathBuf>,

    /// Directory of Markdown files embedded into matching <article id> elements
    #[arg(long)]
    content: Option<PathBuf>,

    /// File or directory copied into the output. Repeatable.
    #[arg(long = "dep")]
    dependencies: Vec<PathBuf>,

    /// Remove the output directory first
    #[arg(long)]
    clean: bool,

    /// Keep building the remaining pages after a failure
    #[arg(long)]
    keep_going: bool,

    /// Maximum template nesting depth
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Page path relative to the root, or literal markup
    input: String,

    /// Site root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON object bound as the page's scope
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print a fragment instead of a complete document
    #[arg(long)]
    fragment: bool,

    /// Maximum template nesting depth
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() {
    let args = normalize_args(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose, cli.quiet);

    let reporter = Reporter::new(cli.no_color);
    let exit_code = match cli.command {
        Command::Build(build_args) => do_build(build_args, &reporter),
        Command::Render(render_args) => do_render(render_args, &reporter),
    };
    process::exit(exit_code);
}

/// `stitch page.html` means `stitch render page.html`; a bare `stitch`
/// means `stitch build`.
fn normalize_args(mut args: Vec<String>) -> Vec<String> {
    let first_pos = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|i| i + 1);
    match first_pos {
        Some(pos) => {
            if !SUBCOMMANDS.contains(&args[pos].as_str()) {
                args.insert(pos, "render".to_string());
            }
        }
        None => {
            let asks_for_info = args
                .iter()
                .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version"));
            if !asks_for_info {
                args.push("build".to_string());
            }
        }
    }
    args
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn do_build(args: BuildArgs, reporter: &Reporter) -> i32 {
    let site = match config::load(&args.root, args.config.as_deref()) {
        Ok(site) => site,
        Err(message) => {
            reporter.emit_message(&message);
            return 1;
        }
    };

    let mut options = site.into_options(args.root);
    if let Some(out) = args.out {
        options.output = out;
    }
    if !args.pages.is_empty() {
        options.pages = args.pages;
    }
    if let Some(content) = args.content {
        options.content = content;
    }
    if !args.dependencies.is_empty() {
        options.dependencies = args.dependencies;
    }
    options.clean |= args.clean;
    options.keep_going |= args.keep_going;
    if let Some(max_depth) = args.max_depth {
        options.max_depth = max_depth;
    }
    if options.max_depth == 0 {
        reporter.emit_message("--max-depth must be at least 1");
        return 1;
    }

    match expander::build(&options) {
        Ok(report) => {
            for failure in &report.failures {
                reporter.emit(&failure.error);
            }
            if report.is_success() {
                info!(
                    "Built {} page(s), copied {} file(s) into {}",
                    report.written.len(),
                    report.copied,
                    options.output.display()
                );
                0
            } else {
                error!(
                    "{} of {} page(s) failed",
                    report.failures.len(),
                    options.pages.len()
                );
                1
            }
        }
        Err(error) => {
            reporter.emit(&error);
            1
        }
    }
}

fn do_render(args: RenderArgs, reporter: &Reporter) -> i32 {
    let scope = match &args.data {
        Some(path) => match Scope::from_file(path, "--data") {
            Ok(scope) => scope,
            Err(error) => {
                reporter.emit(&error);
                return 1;
            }
        },
        None => Scope::new(),
    };

    let max_depth = args.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
    if max_depth == 0 {
        reporter.emit_message("--max-depth must be at least 1");
        return 1;
    }

    let expander = Expander::new(args.root).with_max_depth(max_depth);
    match expander.parse(&args.input, &scope, !args.fragment) {
        Ok(markup) => {
            println!("{}", markup);
            0
        }
        Err(error) => {
            reporter.emit(&error);
            1
        }
    }
}

/// Writes diagnostics to stderr.
struct Reporter {
    writer: StandardStream,
    config: term::Config,
    files: SimpleFiles<String, String>,
}

impl Reporter {
    fn new(no_color: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
            files: SimpleFiles::new(),
        }
    }

    fn emit(&self, error: &ExpandError) {
        self.emit_diagnostic(&error.to_diagnostic());
    }

    fn emit_message(&self, message: &str) {
        self.emit_diagnostic(&Diagnostic::error().with_message(message));
    }

    fn emit_diagnostic(&self, diagnostic: &Diagnostic<usize>) {
        let _ = term::emit_to_write_style(&mut self.writer.lock(), &self.config, &self.files, diagnostic);
    }
}
