use chrono::Local;
use colored::Colorize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Verbosity levels for console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet = 0,
    /// Normal output (default)
    #[default]
    Normal = 1,
    /// Pipeline stages and resolved paths
    Verbose = 2,
    /// Debug output with detailed information
    Debug = 3,
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityLevel::Quiet => write!(f, "quiet"),
            VerbosityLevel::Normal => write!(f, "normal"),
            VerbosityLevel::Verbose => write!(f, "verbose"),
            VerbosityLevel::Debug => write!(f, "debug"),
        }
    }
}

/// The user-facing notification channel. Notices go to stderr; `plain` is the
/// only stdout output, for command results like `config show`. Errors, warnings
/// and notices are also appended to the log file when one is configured.
#[derive(Debug, Clone, Default)]
pub struct Console {
    verbosity: VerbosityLevel,
    log_file: Option<PathBuf>,
}

impl Console {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn should_show(&self, level: VerbosityLevel) -> bool {
        self.verbosity >= level
    }

    /// Append a timestamped line to the log file. Failures are ignored; logging
    /// never aborts a paste.
    pub fn log(&self, message: &str) {
        let Some(path) = &self.log_file else {
            return;
        };
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", format_log_line(&Local::now(), message));
        }
    }

    pub fn error(&self, message: &str) {
        self.log(message);
        if self.verbosity > VerbosityLevel::Quiet {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
    }

    pub fn warning(&self, message: &str) {
        self.log(message);
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(message);
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("{}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            eprintln!("{} {}", "✓".green(), message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.should_show(VerbosityLevel::Verbose) {
            eprintln!("{}", message.dimmed());
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show(VerbosityLevel::Debug) {
            eprintln!("{} {}", "debug:".dimmed(), message);
        }
    }

    pub fn plain(&self, message: &str) {
        if self.should_show(VerbosityLevel::Normal) {
            println!("{}", message);
        }
    }
}

pub fn format_log_line<Tz>(at: &chrono::DateTime<Tz>, message: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("[{}] {}", at.format("%m-%d %H:%M:%S"), message)
}

/// `<data dir>/paste-image/paste-image.log`, when the platform has a data dir.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("paste-image").join("paste-image.log"))
}

static GLOBAL_CONSOLE: OnceLock<Arc<Console>> = OnceLock::new();

pub fn init_console(console: Console) {
    let _ = GLOBAL_CONSOLE.set(Arc::new(console));
}

/// The global console. Falls back to a default console when `init_console` was
/// never called, as in library use and tests.
pub fn console() -> Arc<Console> {
    GLOBAL_CONSOLE
        .get_or_init(|| Arc::new(Console::default()))
        .clone()
}
