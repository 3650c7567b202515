use std::fmt;

/// Crate-wide error: a plain message built wherever the failure is
/// observed. Only the loader produces these; the pipeline stages
/// degrade to omission instead of failing.
#[derive(Debug)]
pub struct Error(String);

impl Error {
    pub fn msg<M: Into<String>>(msg: M) -> Self {
        Error(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::msg(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::msg(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
