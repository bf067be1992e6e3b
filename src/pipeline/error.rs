#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum PipelineError {
    #[error("Pipe '{name}' is not registered")]
    PipeNotFound { name: String },

    #[error("Filter '{filter}' not found in pipe '{pipe}'")]
    FilterNotFound { pipe: String, filter: String },

    #[error("{pipe} failed")]
    NoResult { pipe: String },
}

impl PipelineError {
    pub fn pipe_not_found(name: &str) -> Self {
        PipelineError::PipeNotFound {
            name: name.to_string(),
        }
    }

    pub fn filter_not_found(pipe: &str, filter: &str) -> Self {
        PipelineError::FilterNotFound {
            pipe: pipe.to_string(),
            filter: filter.to_string(),
        }
    }
}
