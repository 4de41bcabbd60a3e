use console::style;
use ecogep_core::GepError;
use std::fmt;
use std::path::Path;

/// Error with remediation hints, printed before the process exits
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// No API key in the environment and no terminal to ask on
pub fn credential_missing() -> CliError {
    CliError::new(GepError::CredentialMissing.user_message())
        .with_context("An API key is required before a photo can be valued.")
        .with_suggestion("Set ZHIPUAI_API_KEY: export ZHIPUAI_API_KEY=\"<your key>\"")
        .with_suggestion("Or run interactively without --json to be prompted for it")
        .with_help("Run: gep assess --help")
}

pub fn image_not_found(path: &Path) -> CliError {
    CliError::new("Image file not found")
        .with_context(format!("The specified photo does not exist.\n\nPath: {}", path.display()))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Upload a JPG or PNG photo")
        .with_help("Run: gep assess --help")
}

/// Unknown `--category` for the table command
pub fn category_not_found(category: &str, known: &[&str]) -> CliError {
    CliError::new(format!("Unknown ecosystem category: {}", category))
        .with_context(format!("Known categories:\n  {}", known.join("\n  ")))
        .with_suggestion("Use a full row label, e.g. \"阔叶林 (森林)\"")
        .with_suggestion("Or a land class to list all of its rows, e.g. \"森林\"")
        .with_help("Run: gep table")
}

/// Failure reported by the valuation pipeline, shown with its user-facing text
pub fn pipeline_failed(err: &GepError) -> CliError {
    let error = CliError::new(err.user_message()).with_context(format!("Details: {}", err));
    match err {
        GepError::InvalidImage { .. } => error.with_suggestion("Upload a JPG or PNG photo"),
        GepError::Api { status: 401, .. } | GepError::Api { status: 403, .. } => {
            error.with_suggestion("Check that ZHIPUAI_API_KEY holds a valid key")
        }
        GepError::Transport { .. } | GepError::Api { .. } => error
            .with_suggestion("Try again in a moment")
            .with_suggestion("Or allow retries: gep --retries 2 assess <image>"),
        GepError::MalformedResponse { .. } => error.with_suggestion("Run the valuation again"),
        _ => error,
    }
}
