//! Error type shared by the whole solver.

use thiserror::Error;

/// Errors raised by evaluation, neighborhood construction and I/O.
#[derive(Error, Debug)]
pub enum SchedError {
    /// The schedule is not a permutation of the job identities.
    #[error("Number of jobs {jobs} != {unique} uniquely scheduled jobs (schedule length {len})")]
    InvalidSchedule {
        jobs: usize,
        unique: usize,
        len: usize,
    },

    /// A neighborhood needs at least two jobs to produce a move.
    #[error("Neighborhood requires at least 2 jobs, got {jobs}")]
    TooFewJobs { jobs: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operating system could not provide a random seed.
    #[error("Cannot acquire entropy: {0}")]
    Entropy(String),
}

pub type Result<T> = std::result::Result<T, SchedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchedError::InvalidSchedule { jobs: 3, unique: 2, len: 3 };
        assert_eq!(
            err.to_string(),
            "Number of jobs 3 != 2 uniquely scheduled jobs (schedule length 3)"
        );

        let err = SchedError::TooFewJobs { jobs: 1 };
        assert!(err.to_string().contains("at least 2 jobs"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SchedError = io.into();
        assert!(matches!(err, SchedError::Io(_)));
    }
}
