use minicc::lexer::LexError;
use minicc::parser::ParseError;
use minicc::semantic_analysis::SemAnalysisError;

pub(crate) type Result<T> = std::result::Result<T, DriverError>;

pub enum DriverError {
    InputFileDoesNotExist(String),
    PreprocessorFailed(Option<i32>),
    AssemblerFailed(Option<i32>),
    LexerError(String),
    ParserError(String),
    SemanticError(String),
    IoError(String),
}

impl DriverError {
    /// External tools propagate their own exit code; everything else is a
    /// plain failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PreprocessorFailed(Some(code)) | Self::AssemblerFailed(Some(code)) => *code,
            _ => 1,
        }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InputFileDoesNotExist(name) => write!(f, "file {name} does not exist"),
            Self::PreprocessorFailed(_) => write!(f, "failed to run the preprocessor"),
            Self::AssemblerFailed(_) => write!(f, "failed to run the assembler"),
            Self::LexerError(e) => write!(f, "lex error: {e}"),
            Self::ParserError(e) => write!(f, "parse error: {e}"),
            Self::SemanticError(e) => write!(f, "semantic error: {e}"),
            Self::IoError(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::fmt::Debug for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for DriverError {}

macro_rules! from_error {
    ($e:ty, $variant:path) => {
        impl From<$e> for DriverError {
            fn from(e: $e) -> Self {
                $variant(e.to_string())
            }
        }
    };
}

from_error!(std::io::Error, Self::IoError);
from_error!(LexError, Self::LexerError);
from_error!(ParseError, Self::ParserError);
from_error!(SemAnalysisError, Self::SemanticError);
