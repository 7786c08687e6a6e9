//! CLI module for agodoc
//!
//! agodoc takes no arguments: Acme supplies everything through `$winid`
//! and the working directory.

use clap::Parser;

const LONG_ABOUT: &str = r#"
agodoc - Go documentation for the identifier under the Acme cursor

Run agodoc from the tag of a window holding a Go file. It reads the
selection and unsaved body of that window, works out which package-level
declaration the identifier refers to, and runs `go doc` on it. The output
lands in the +Errors window.

ENVIRONMENT:
  winid                  Acme window id (set by Acme)
  NAMESPACE              plan9port namespace directory
  AGODOC_VIEWER          documentation command, default "go doc"
  AGODOC_EXPORTED_ONLY   refuse unexported identifiers (true/false)
  RUST_LOG               log filter, e.g. agodoc=debug

Settings can also be kept in ~/.config/agodoc/config.toml.
"#;

/// agodoc - Go documentation for the identifier under the Acme cursor
#[derive(Parser, Debug)]
#[command(name = "agodoc")]
#[command(author, version, about, long_about = LONG_ABOUT)]
pub struct Cli {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        assert!(Cli::try_parse_from(["agodoc"]).is_ok());
        assert!(Cli::try_parse_from(["agodoc", "extra"]).is_err());
    }
}
