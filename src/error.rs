use std::fmt;

use thiserror::Error;

/// Structural and precondition failures. These are raised at the point of
/// violation and are not meant to be caught inside the engine.
#[derive(Error, Debug)]
pub enum VariantError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("Logic error: {0}")]
    Logic(String),
    #[error("Domain error: {0}")]
    Domain(String),
    #[error("Range error: {0}")]
    Range(String),
    #[error("Locked: {0}")]
    Locked(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, VariantError>;

impl VariantError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into(), line: None, col: None }
    }
}

// Helper conversions
impl From<config::ConfigError> for VariantError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<std::io::Error> for VariantError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<serde_json::Error> for VariantError {
    fn from(e: serde_json::Error) -> Self { Self::Config(e.to_string()) }
}
impl<R: pest::RuleType> From<pest::error::Error<R>> for VariantError {
    fn from(e: pest::error::Error<R>) -> Self {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        Self::Parse { message: e.variant.message().to_string(), line: Some(line), col: Some(col) }
    }
}

// ------------- Command outcomes -------------

/// Closed set of outcomes reported by value commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    Failure,
    CommandInvalidContext,
    CommandInvalidNumberOfArguments,
    ParameterInvalidContext,
    ParameterInvalidKey,
    ParameterInvalidType,
    ParameterInvalidValue,
    ParameterUnsetValue,
    ParameterInvalidUnit,
    ParsingFailure,
}

impl ErrorCode {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCode::Success => "CEC_SUCCESS",
            ErrorCode::Failure => "CEC_FAILURE",
            ErrorCode::CommandInvalidContext => "CEC_COMMAND_INVALID_CONTEXT",
            ErrorCode::CommandInvalidNumberOfArguments => "CEC_COMMAND_INVALID_NUMBER_OF_ARGUMENTS",
            ErrorCode::ParameterInvalidContext => "CEC_PARAMETER_INVALID_CONTEXT",
            ErrorCode::ParameterInvalidKey => "CEC_PARAMETER_INVALID_KEY",
            ErrorCode::ParameterInvalidType => "CEC_PARAMETER_INVALID_TYPE",
            ErrorCode::ParameterInvalidValue => "CEC_PARAMETER_INVALID_VALUE",
            ErrorCode::ParameterUnsetValue => "CEC_PARAMETER_UNSET_VALUE",
            ErrorCode::ParameterInvalidUnit => "CEC_PARAMETER_INVALID_UNIT",
            ErrorCode::ParsingFailure => "CEC_PARSING_FAILURE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure half of a value command outcome: an error code plus a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct CommandError {
    code: ErrorCode,
    message: String,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
    pub fn code(&self) -> ErrorCode {
        self.code
    }
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<VariantError> for CommandError {
    fn from(e: VariantError) -> Self { Self::new(ErrorCode::Failure, e.to_string()) }
}

pub type CommandResult<T = ()> = std::result::Result<T, CommandError>;

/// The code carried by a command outcome, `Success` included.
pub fn error_code<T>(result: &CommandResult<T>) -> ErrorCode {
    match result {
        Ok(_) => ErrorCode::Success,
        Err(e) => e.code(),
    }
}
