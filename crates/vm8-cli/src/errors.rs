use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vm8_core::{LayoutError, LoadError};

/// Failures reported before or after the CPU runs. Exit status 2.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read program image {}: {source}", .path.display())]
    ReadImage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid memory layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("cannot load program: {0}")]
    Load(#[from] LoadError),
    #[error("cannot serialize cpu state: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use vm8_core::{LayoutError, LoadError};

    #[test]
    fn messages_carry_underlying_cause() {
        let load = CliError::from(LoadError::TooLarge {
            len: 300,
            capacity: 240,
        });
        assert_eq!(
            load.to_string(),
            "cannot load program: program image is 300 bytes but the code region holds 240"
        );

        let layout = CliError::from(LayoutError::InvalidStackSize(0));
        assert_eq!(
            layout.to_string(),
            "invalid memory layout: stack size must be between 1 and 255 bytes, got 0"
        );
    }
}
