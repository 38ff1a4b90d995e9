/// Result alias that carries the custom [`SandboxError`] type.
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Free-form message, mostly used for poisoned shared state.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// A plugin list already holds an entry with this name.
    #[error("{kind} `{name}` is already registered")]
    DuplicateName { kind: &'static str, name: String },
    /// A plugin was registered with a blank name.
    #[error("{kind} names must not be empty")]
    EmptyName { kind: &'static str },
    /// Selection index past the end of the plugin list.
    #[error("no {kind} at index {index} ({len} registered)")]
    UnknownSelection {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    /// Selection by a name that no registered plugin carries.
    #[error("no {kind} named `{name}` is registered")]
    UnknownPlugin { kind: &'static str, name: String },
    /// Text that does not parse as a note name such as `C4` or `Eb3`.
    #[error("unrecognised note `{0}`")]
    InvalidNote(String),
    /// Option that names none of the oscillator types.
    #[error("unrecognised oscillator type `{0}`")]
    UnknownOscillator(String),
    /// Fault raised by a sound engine. Surfaces pass these through untouched.
    #[error("sound engine: {0}")]
    Engine(String),
    /// Error bubbled up from realfft.
    #[error(transparent)]
    Fft(#[from] realfft::FftError),
}

impl SandboxError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn engine<T: Into<String>>(msg: T) -> Self {
        Self::Engine(msg.into())
    }
}

impl From<&str> for SandboxError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SandboxError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
