use clap::ValueEnum;

/// CLI output format selection.
///
/// Controls whether commands print human-readable output or JSON for CI integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatOptions {
    /// JSON format for CI/CD pipelines
    #[value(name = "json")]
    Json,
    /// Human-readable colored terminal output
    #[value(name = "stdout")]
    Stdout,
}

impl FormatOptions {
    pub fn print(&self, stdout_msg: &str, json_msg: &str) {
        match self {
            Self::Stdout => println!("{stdout_msg}"),
            Self::Json => println!("{json_msg}"),
        }
    }

    /// Print only in human-readable mode; JSON output stays a single document.
    pub fn status(&self, stdout_msg: &str) {
        if let Self::Stdout = self {
            println!("{stdout_msg}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_format_options_from_str() {
        assert_eq!(
            FormatOptions::from_str("json", false).unwrap(),
            FormatOptions::Json
        );
        assert_eq!(
            FormatOptions::from_str("stdout", false).unwrap(),
            FormatOptions::Stdout
        );
        assert!(FormatOptions::from_str("yaml", false).is_err());
    }
}
