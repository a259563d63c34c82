//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--repo <path>` / `-C`: Repository to operate on (default `.`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Print reports as JSON

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::RestoreMode;

/// idemgit - idempotent Git tasks for automation
#[derive(Parser, Debug)]
#[command(name = "idemgit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to operate on
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Key material for clone and push.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// User name for the remote
    #[arg(long)]
    pub username: Option<String>,

    /// Public key file (optional with --private-key)
    #[arg(long, value_name = "FILE")]
    pub public_key: Option<PathBuf>,

    /// Private key file
    #[arg(long, value_name = "FILE")]
    pub private_key: Option<PathBuf>,

    /// Prompt for the private key's passphrase
    #[arg(long, requires = "private_key")]
    pub ask_passphrase: bool,
}

/// Whether to create or delete a branch or tag.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionArg {
    #[default]
    Add,
    Delete,
}

/// Where `restore` writes.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreModeArg {
    /// Reset index entries only
    #[default]
    Staged,
    /// Rewrite working files and their index entries
    Workdir,
}

impl From<ActionArg> for crate::tasks::Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Add => crate::tasks::Action::Add,
            ActionArg::Delete => crate::tasks::Action::Delete,
        }
    }
}

impl From<RestoreModeArg> for RestoreMode {
    fn from(arg: RestoreModeArg) -> Self {
        match arg {
            RestoreModeArg::Staged => RestoreMode::Staged,
            RestoreModeArg::Workdir => RestoreMode::Workdir,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a repository unless one already exists
    #[command(
        name = "init",
        long_about = "Create a repository unless one already exists.\n\n\
            The initial branch comes from the `default_branch` configuration \
            key (default `master`). Running init on an existing repository \
            reports no change.",
        after_help = "\
EXAMPLES:
    idemgit init ./work
    idemgit init --bare /srv/git/project.git"
    )]
    Init {
        /// Directory to initialize (default: --repo)
        path: Option<PathBuf>,

        /// Create a bare repository
        #[arg(long)]
        bare: bool,
    },

    /// Clone an upstream unless the destination is already a repository
    #[command(
        name = "clone",
        after_help = "\
EXAMPLES:
    idemgit clone https://example.com/project.git ./project
    idemgit clone /srv/git/project.git ./project --branch develop
    idemgit clone git@example.com:project.git ./project --private-key ~/.ssh/id_ed25519"
    )]
    Clone {
        /// Upstream URL or absolute local path
        upstream: String,

        /// Destination directory
        path: PathBuf,

        /// Create a bare clone
        #[arg(long)]
        bare: bool,

        /// Branch to check out instead of the upstream's HEAD
        #[arg(short, long)]
        branch: Option<String>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Stage files for commit
    #[command(
        name = "add",
        long_about = "Stage files for commit.\n\n\
            Relative paths are taken from the worktree root. Paths outside \
            the worktree and ignored files are skipped. Files that are \
            already staged report no change."
    )]
    Add {
        /// Files to stage
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Commit the staged changes
    #[command(name = "commit")]
    Commit {
        /// Branch to commit to (default: current branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// Author email
        #[arg(long)]
        email: Option<String>,
    },

    /// Create or delete a branch
    #[command(
        name = "branch",
        after_help = "\
EXAMPLES:
    idemgit branch feature
    idemgit branch feature --parent v1.0
    idemgit branch feature --action delete"
    )]
    Branch {
        /// Branch name
        name: Option<String>,

        #[arg(long, value_enum, default_value_t = ActionArg::Add)]
        action: ActionArg,

        /// Ref-ish the new branch starts at (default: HEAD)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Switch branches, or check out files from a branch
    #[command(
        name = "checkout",
        long_about = "Switch branches, or check out files from a branch.\n\n\
            Without files the branch's tree is checked out and HEAD moves to \
            it. With files only those paths are written and HEAD stays put."
    )]
    Checkout {
        /// Branch, tag or remote branch to check out
        branch: String,

        /// Files to check out
        files: Vec<PathBuf>,

        /// Overwrite local modifications
        #[arg(short, long)]
        force: bool,
    },

    /// Restore files from a commit
    #[command(
        name = "restore",
        after_help = "\
EXAMPLES:
    # Unstage a file
    idemgit restore notes.txt

    # Discard local edits and staged changes
    idemgit restore notes.txt --mode workdir

    # Bring back an older version
    idemgit restore notes.txt --source v1.0 --mode workdir"
    )]
    Restore {
        /// Files to restore
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Ref-ish to restore from (default: HEAD)
        #[arg(short, long)]
        source: Option<String>,

        #[arg(long, value_enum, default_value_t = RestoreModeArg::Staged)]
        mode: RestoreModeArg,
    },

    /// Create or delete a tag
    #[command(name = "tag")]
    Tag {
        /// Tag name
        tag: String,

        #[arg(long, value_enum, default_value_t = ActionArg::Add)]
        action: ActionArg,

        /// Ref-ish to tag (required for add)
        #[arg(long = "ref")]
        reference: Option<String>,

        /// Annotate the tag with this message
        #[arg(short, long)]
        message: Option<String>,

        /// Tagger name for annotated tags
        #[arg(long)]
        author: Option<String>,

        /// Tagger email for annotated tags
        #[arg(long)]
        email: Option<String>,
    },

    /// Push branches and tags to a remote
    #[command(
        name = "push",
        after_help = "\
EXAMPLES:
    idemgit push --branch master
    idemgit push --remote backup --branch master --tag v1.0"
    )]
    Push {
        /// Remote name (default: configured remote, `origin`)
        #[arg(long)]
        remote: Option<String>,

        /// Branch to push (repeatable)
        #[arg(short, long = "branch")]
        branches: Vec<String>,

        /// Tag to push (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["idemgit", "add", "a.txt", "--json", "-C", "/tmp/r"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.repo, PathBuf::from("/tmp/r"));
        match cli.command {
            Command::Add { files } => assert_eq!(files, vec![PathBuf::from("a.txt")]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn push_collects_repeated_refs() {
        let cli = Cli::try_parse_from([
            "idemgit", "push", "--branch", "master", "--tag", "v1", "--tag", "v2",
        ])
        .unwrap();
        match cli.command {
            Command::Push { branches, tags, .. } => {
                assert_eq!(branches, vec!["master"]);
                assert_eq!(tags, vec!["v1", "v2"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn restore_mode_defaults_to_staged() {
        let cli = Cli::try_parse_from(["idemgit", "restore", "a.txt"]).unwrap();
        match cli.command {
            Command::Restore { mode, source, .. } => {
                assert_eq!(mode, RestoreModeArg::Staged);
                assert!(source.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn ask_passphrase_requires_private_key() {
        let result = Cli::try_parse_from(["idemgit", "push", "--branch", "m", "--ask-passphrase"]);
        assert!(result.is_err());
    }
}
