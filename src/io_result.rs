use std::fmt::{Display, Formatter};

/// The outcome of an I/O operation on the VHAL connection: the number of bytes transferred, or
///  [IoResult::FAILED] together with a human readable cause.
///
/// Each layer that intercepts a failure prefixes the message with its own context, so the message
///  reads from the outermost to the innermost cause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IoResult {
    pub transferred: isize,
    pub message: String,
}

impl IoResult {
    pub const FAILED: isize = -1;

    pub fn ok(transferred: usize) -> IoResult {
        IoResult {
            transferred: isize::try_from(transferred).unwrap_or(isize::MAX),
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> IoResult {
        IoResult {
            transferred: Self::FAILED,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.transferred == Self::FAILED
    }

    pub fn with_context(mut self, context: &str) -> IoResult {
        self.message = format!("{}{}", context, self.message);
        self
    }
}

impl From<IoResult> for (isize, String) {
    fn from(value: IoResult) -> Self {
        (value.transferred, value.message)
    }
}

impl From<std::io::Error> for IoResult {
    fn from(value: std::io::Error) -> Self {
        IoResult::failed(value.to_string())
    }
}

impl Display for IoResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_failure() {
            write!(f, "failed: {}", self.message)
        }
        else {
            write!(f, "{} bytes", self.transferred)
        }
    }
}
