use clap::{Parser, Subcommand};

/// swiftrun - Run Swift scripts as cached, compiled executables
///
/// `swiftrun <script> [args...]` builds the script into a SwiftPM package the
/// first time (and whenever it changes) and then runs the executable.
#[derive(Parser, Debug)]
#[command(name = "swiftrun")]
#[command(author = "Tuist Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Run Swift scripts as cached, compiled executables",
    override_usage = "swiftrun <SCRIPT> [ARGS]... [--edit]\n       swiftrun cache <COMMAND>",
    long_about = None
)]
pub struct Cli {
    /// Config file path
    #[arg(short = 'c', long, env = "SWIFTRUN_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and clean generated packages
    Cache(CacheArgs),
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show identity, paths and staleness for a script
    Status {
        /// Script path or https URL
        script: String,
    },

    /// Remove the generated package for a script
    Clean {
        /// Script path or https URL (omit with --all)
        script: Option<String>,

        /// Remove every generated package
        #[arg(long, conflicts_with = "script")]
        all: bool,
    },

    /// List generated packages
    List {
        /// Show paths and sizes
        #[arg(short, long)]
        verbose: bool,
    },
}

/// First arguments routed to the management CLI instead of a script
const MANAGEMENT_TOKENS: &[&str] = &["cache", "help", "-h", "--help", "-V", "--version"];

/// Flag that opens the generated package in an editor
pub const EDIT_FLAG: &str = "--edit";

/// Usage line printed when no script is given
pub const USAGE: &str = "swiftrun <script> [args...] # run a Swift script as a cached executable";

/// How the process was invoked
#[derive(Debug)]
pub enum Invocation {
    Manage(Cli),
    Run(RunRequest),
    /// No script given
    Usage,
}

impl Invocation {
    /// Route a full argv (program name first)
    ///
    /// Scripts whose name collides with a management command can still be run
    /// after a `--`.
    pub fn from_args(argv: Vec<String>) -> Self {
        let is_management = argv
            .get(1)
            .is_some_and(|first| MANAGEMENT_TOKENS.contains(&first.as_str()));

        if is_management {
            return Self::Manage(Cli::parse_from(argv));
        }

        match RunRequest::parse(argv.into_iter().skip(1).collect()) {
            Some(request) => Self::Run(request),
            None => Self::Usage,
        }
    }
}

/// A script invocation: locator followed by the script's own arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Locator first, exactly as typed
    pub arguments: Vec<String>,
}

impl RunRequest {
    /// Parse arguments after the program name
    ///
    /// Everything up to and including the first `--` is discarded.
    pub fn parse(mut arguments: Vec<String>) -> Option<Self> {
        if let Some(tail) = arguments.iter().position(|a| a == "--") {
            arguments.drain(..=tail);
        }
        if arguments.is_empty() {
            None
        } else {
            Some(Self { arguments })
        }
    }

    pub fn locator(&self) -> &str {
        &self.arguments[0]
    }

    /// Arguments passed to the executable after argv[0]
    pub fn script_args(&self) -> &[String] {
        &self.arguments[1..]
    }

    /// `--edit` as the last argument opens the package instead of running it
    ///
    /// When the runner runs itself, `--edit` only applies as the sole extra
    /// argument; otherwise it belongs to the runner being built.
    pub fn wants_edit(&self, is_self: bool) -> bool {
        self.arguments.last().map(String::as_str) == Some(EDIT_FLAG)
            && (!is_self || self.arguments.len() == 2)
    }
}
