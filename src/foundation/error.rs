pub type FleetResult<T> = Result<T, FleetError>;

/// Every failure a job, worker or fleet can report.
///
/// Errors are scoped to a single job: a failing worker never produces an error in a sibling job.
#[derive(thiserror::Error, Debug)]
pub enum FleetError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("initialization error: {0}")]
    Initialization(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("row render error: {0}")]
    Render(String),

    #[error("job cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Copyable discriminant of [`FleetError`], handy for counting and asserting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Initialization,
    Protocol,
    Transport,
    Render,
    Cancelled,
    Serde,
    Other,
}

impl FleetError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Render(_) => ErrorKind::Render,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}
