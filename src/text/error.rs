#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum TextError {
    #[error("Invalid patch string: {line}")]
    InvalidPatchHeader { line: String },

    #[error("Invalid patch mode '{mode}' in: {line}")]
    InvalidPatchMode { mode: char, line: String },

    #[error("Illegal escape in {context}: {input}")]
    IllegalEscape { context: &'static str, input: String },

    #[error("Invalid diff operation in delta: {token}")]
    InvalidDiffDelta { token: String },

    #[error("Invalid number in delta: {token}")]
    InvalidDeltaNumber { token: String },

    #[error("Delta length ({consumed}) does not equal source text length ({expected})")]
    DeltaLengthMismatch { consumed: usize, expected: usize },

    #[error("Pattern of {length} characters exceeds the {max_bits} bit match limit")]
    PatternTooLong { length: usize, max_bits: usize },
}

impl TextError {
    pub fn invalid_patch_header(line: &str) -> Self {
        TextError::InvalidPatchHeader {
            line: line.to_string(),
        }
    }

    pub fn invalid_patch_mode(mode: char, line: &str) -> Self {
        TextError::InvalidPatchMode {
            mode,
            line: line.to_string(),
        }
    }

    pub fn illegal_escape(context: &'static str, input: &str) -> Self {
        TextError::IllegalEscape {
            context,
            input: input.to_string(),
        }
    }
}
