//! Available subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use pkgshelf_core::DEFAULT_MAX_CONCURRENT;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one or more URLs, at most `--max-concurrent` at a time
    Fetch(FetchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URLs to download; each is saved under its last path segment
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Directory to save downloads into
    #[arg(short, long, env = "PKGSHELF_DEST", default_value = ".")]
    pub dest: PathBuf,

    /// Maximum simultaneous downloads (0 is treated as 1)
    #[arg(short = 'j', long, env = "PKGSHELF_MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: u32,
}

#[cfg(test)]
mod tests {
    use crate::Cli;
    use clap::Parser;
    use std::path::Path;

    use super::*;

    #[test]
    fn fetch_defaults() {
        let cli = Cli::parse_from(["pkgshelf", "fetch", "https://example.test/a.tar.gz"]);
        let Commands::Fetch(args) = cli.command;
        assert_eq!(args.urls, vec!["https://example.test/a.tar.gz"]);
        assert_eq!(args.max_concurrent, DEFAULT_MAX_CONCURRENT);
    }

    #[test]
    fn fetch_flags() {
        let cli = Cli::parse_from([
            "pkgshelf",
            "fetch",
            "-j",
            "4",
            "--dest",
            "/tmp/pkgs",
            "https://example.test/a.tar.gz",
            "https://example.test/b.tar.gz",
        ]);
        let Commands::Fetch(args) = cli.command;
        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.max_concurrent, 4);
        assert_eq!(args.dest, Path::new("/tmp/pkgs"));
    }

    #[test]
    fn fetch_requires_a_url() {
        assert!(Cli::try_parse_from(["pkgshelf", "fetch"]).is_err());
    }
}
