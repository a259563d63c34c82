//! Integration tests for name resolution, status classification and the
//! index workflows (stage, commit, restore).
//!
//! Fixtures are real repositories built with the git CLI in a TempDir.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use idemgit::core::config::Config;
use idemgit::core::resolve;
use idemgit::core::status::{self, FileStatus};
use idemgit::core::types::{Identity, RefName};
use idemgit::engine::{self, CommitOutcome, EngineError, RestoreMode};
use idemgit::git::{Git, GitError};

struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn unborn() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        Self { dir }
    }

    fn new() -> Self {
        let repo = Self::unborn();
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    fn write(&self, path: &str, content: &str) {
        std::fs::write(self.path().join(path), content).unwrap();
    }

    fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).unwrap()
    }

    fn commit_file(&self, path: &str, content: &str, message: &str) {
        self.write(path, content);
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
    }

    fn rev(&self, spec: &str) -> String {
        let output = Command::new("git")
            .args(["rev-parse", spec])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// Leave README.md conflicted between `master` and `other`.
    fn conflict(&self) {
        run_git(self.path(), &["checkout", "-b", "other"]);
        self.commit_file("README.md", "other side\n", "other");
        run_git(self.path(), &["checkout", "master"]);
        self.commit_file("README.md", "master side\n", "master");
        let status = Command::new("git")
            .args(["merge", "other"])
            .current_dir(self.path())
            .output()
            .expect("git merge failed to start")
            .status;
        assert!(!status.success(), "merge was expected to conflict");
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn files(paths: &[&str]) -> Vec<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

// =============================================================================
// Name resolution
// =============================================================================

mod resolution {
    use super::*;

    #[test]
    fn branch_wins_over_tag_with_the_same_name() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["tag", "release"]);
        run_git(repo.path(), &["branch", "release"]);

        let found = resolve::dwim(&repo.git(), "release").unwrap();
        assert_eq!(found, Some(RefName::new("refs/heads/release").unwrap()));
    }

    #[test]
    fn tags_and_remote_refs_resolve_by_short_name() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["tag", "v1"]);
        run_git(repo.path(), &["update-ref", "refs/remotes/origin/main", "HEAD"]);
        let git = repo.git();

        assert_eq!(
            resolve::dwim(&git, "v1").unwrap(),
            Some(RefName::new("refs/tags/v1").unwrap())
        );
        assert_eq!(
            resolve::dwim(&git, "origin/main").unwrap(),
            Some(RefName::new("refs/remotes/origin/main").unwrap())
        );
    }

    #[test]
    fn resolve_accepts_abbreviated_hashes() {
        let repo = TestRepo::new();
        let full = repo.rev("HEAD");

        let resolved = resolve::resolve(&repo.git(), &full[..8]).unwrap().unwrap();
        assert_eq!(resolved.commit.as_str(), full);
        assert!(resolved.reference.is_none());
    }

    #[test]
    fn resolve_reports_the_branch_it_went_through() {
        let repo = TestRepo::new();
        let resolved = resolve::resolve(&repo.git(), "master").unwrap().unwrap();
        assert_eq!(
            resolved.reference,
            Some(RefName::new("refs/heads/master").unwrap())
        );
        assert_eq!(resolve::resolve(&repo.git(), "nowhere").unwrap(), None);
    }

    #[test]
    fn canonicalize_synthesizes_missing_branches() {
        let repo = TestRepo::new();
        let name = resolve::canonicalize(&repo.git(), &Config::default(), Some("new-work")).unwrap();
        assert_eq!(name.as_str(), "refs/heads/new-work");
    }

    #[test]
    fn unborn_default_follows_head_not_config() {
        let repo = TestRepo::unborn();
        run_git(repo.path(), &["symbolic-ref", "HEAD", "refs/heads/trunk"]);

        let name = resolve::canonicalize(&repo.git(), &Config::default(), None).unwrap();
        assert_eq!(name.as_str(), "refs/heads/trunk");
    }

    #[test]
    fn detached_head_canonicalizes_to_head() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["checkout", "--detach"]);

        let name = resolve::canonicalize(&repo.git(), &Config::default(), None).unwrap();
        assert!(name.is_head());
    }
}

// =============================================================================
// Status
// =============================================================================

mod status_maps {
    use super::*;

    #[test]
    fn workdir_status_lists_new_modified_and_ignored() {
        let repo = TestRepo::new();
        repo.commit_file(".gitignore", "build/\n", "ignore build");
        std::fs::create_dir(repo.path().join("build")).unwrap();
        repo.write("build/out.o", "bin");
        repo.write("README.md", "changed\n");
        repo.write("fresh.txt", "new\n");

        let map = status::index_vs_workdir(&repo.git()).unwrap();
        assert_eq!(map.get("README.md"), Some(FileStatus::Modified));
        assert_eq!(map.get("fresh.txt"), Some(FileStatus::New));
        assert_eq!(map.get("build/"), Some(FileStatus::Ignored));
        assert!(!map.contains("build/out.o"));
    }

    #[test]
    fn head_vs_index_on_unborn_compares_with_empty_tree() {
        let repo = TestRepo::unborn();
        repo.write("a.txt", "a\n");
        run_git(repo.path(), &["add", "a.txt"]);

        let map = status::head_vs_index(&repo.git(), None).unwrap();
        assert_eq!(map.get("a.txt"), Some(FileStatus::New));
    }

    #[test]
    fn unknown_explicit_target_is_an_error() {
        let repo = TestRepo::new();
        let result = status::head_vs_index(&repo.git(), Some("missing"));
        assert!(matches!(result, Err(GitError::RefNotFound { .. })));
    }

    #[test]
    fn staged_rename_keeps_the_old_path_visible() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["mv", "README.md", "INTRO.md"]);

        let map = status::head_vs_index(&repo.git(), None).unwrap();
        assert_eq!(map.get("INTRO.md"), Some(FileStatus::Renamed));
        assert_eq!(map.get("README.md"), Some(FileStatus::Deleted));
    }

    #[test]
    fn conflicts_show_up_on_both_sides() {
        let repo = TestRepo::new();
        repo.conflict();
        let git = repo.git();

        assert_eq!(
            status::index_vs_workdir(&git).unwrap().get("README.md"),
            Some(FileStatus::Conflicted)
        );
        assert_eq!(
            status::head_vs_index(&git, None).unwrap().get("README.md"),
            Some(FileStatus::Conflicted)
        );
    }
}

// =============================================================================
// Staging
// =============================================================================

mod staging {
    use super::*;

    #[test]
    fn staging_twice_is_a_no_op_the_second_time() {
        let repo = TestRepo::new();
        repo.write("a.txt", "a\n");
        let git = repo.git();

        let first = engine::stage(&git, &files(&["a.txt"])).unwrap();
        assert!(first.changed());
        assert_eq!(first.staged, vec!["a.txt"]);

        let second = engine::stage(&git, &files(&["a.txt"])).unwrap();
        assert!(!second.changed());
        assert!(second.staged.is_empty());
        assert_eq!(second.ignored, vec!["a.txt"]);
    }

    #[test]
    fn outside_and_missing_paths_are_ignored() {
        let repo = TestRepo::new();
        let elsewhere = TempDir::new().unwrap();
        let outside = elsewhere.path().join("x.txt");
        std::fs::write(&outside, "x").unwrap();

        let outcome = engine::stage(
            &repo.git(),
            &[outside.clone(), PathBuf::from("ghost.txt"), PathBuf::from("../escape.txt")],
        )
        .unwrap();

        assert!(outcome.staged.is_empty());
        assert_eq!(outcome.ignored.len(), 3);
    }

    #[test]
    fn absolute_paths_inside_the_worktree_are_staged() {
        let repo = TestRepo::new();
        repo.write("abs.txt", "abs\n");

        let outcome = engine::stage(&repo.git(), &[repo.path().join("abs.txt")]).unwrap();
        assert_eq!(outcome.staged, vec!["abs.txt"]);
    }

    #[test]
    fn deleted_files_are_removed_from_the_index() {
        let repo = TestRepo::new();
        std::fs::remove_file(repo.path().join("README.md")).unwrap();
        let git = repo.git();

        let outcome = engine::stage(&git, &files(&["README.md"])).unwrap();
        assert_eq!(outcome.staged, vec!["README.md"]);
        assert_eq!(
            status::head_vs_index(&git, None).unwrap().get("README.md"),
            Some(FileStatus::Deleted)
        );
    }

    #[test]
    fn duplicate_requests_stage_once() {
        let repo = TestRepo::new();
        repo.write("a.txt", "a\n");

        let outcome = engine::stage(&repo.git(), &files(&["a.txt", "./a.txt"])).unwrap();
        assert_eq!(outcome.staged, vec!["a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn new_symlink_is_staged_as_itself() {
        let repo = TestRepo::new();
        std::os::unix::fs::symlink("README.md", repo.path().join("link")).unwrap();
        let git = repo.git();
        assert_eq!(
            status::index_vs_workdir(&git).unwrap().get("link"),
            Some(FileStatus::New)
        );

        let outcome = engine::stage(&git, &files(&["link"])).unwrap();
        assert_eq!(outcome.staged, vec!["link"]);
        assert!(outcome.ignored.is_empty());
        assert_eq!(
            status::head_vs_index(&git, None).unwrap().get("link"),
            Some(FileStatus::New)
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_a_modified_file_does_not_stage_the_target() {
        let repo = TestRepo::new();
        std::os::unix::fs::symlink("README.md", repo.path().join("link")).unwrap();
        repo.write("README.md", "edited\n");
        let git = repo.git();

        let outcome = engine::stage(&git, &files(&["link"])).unwrap();
        assert_eq!(outcome.staged, vec!["link"]);
        let staged = status::head_vs_index(&git, None).unwrap();
        assert!(staged.contains("link"));
        assert!(!staged.contains("README.md"));
    }

    #[test]
    fn conflicts_refuse_the_whole_batch() {
        let repo = TestRepo::new();
        repo.conflict();
        repo.write("other.txt", "o\n");
        let git = repo.git();

        let err = engine::stage(&git, &files(&["other.txt", "README.md"])).unwrap_err();
        match err {
            EngineError::Conflict { paths } => assert_eq!(paths, vec!["README.md"]),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(!status::head_vs_index(&git, None).unwrap().contains("other.txt"));
    }
}

// =============================================================================
// Commits
// =============================================================================

mod commits {
    use super::*;

    #[test]
    fn unborn_repository_has_no_parents_whatever_the_branch() {
        let repo = TestRepo::unborn();
        let git = repo.git();
        let config = Config::default();

        let default = engine::derive_target(&git, &config, None).unwrap();
        assert_eq!(default.refname.as_str(), "refs/heads/master");
        assert!(default.parents.is_empty());

        let named = engine::derive_target(&git, &config, Some("feature")).unwrap();
        assert_eq!(named.refname.as_str(), "refs/heads/feature");
        assert!(named.parents.is_empty());
    }

    #[test]
    fn orphan_head_still_builds_on_an_existing_branch() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["symbolic-ref", "HEAD", "refs/heads/orphan"]);
        let git = repo.git();
        assert!(git.head_is_unborn().unwrap());
        let config = Config::default();

        let orphan = engine::derive_target(&git, &config, None).unwrap();
        assert_eq!(orphan.refname.as_str(), "refs/heads/orphan");
        assert!(orphan.parents.is_empty());

        let master = engine::derive_target(&git, &config, Some("master")).unwrap();
        assert_eq!(master.refname.as_str(), "refs/heads/master");
        assert_eq!(master.parents.len(), 1);
        assert_eq!(master.parents[0].as_str(), repo.rev("master"));
    }

    #[test]
    fn born_repository_commits_on_top_of_head() {
        let repo = TestRepo::new();
        let target = engine::derive_target(&repo.git(), &Config::default(), None).unwrap();

        assert_eq!(target.refname.as_str(), "refs/heads/master");
        assert_eq!(target.parents.len(), 1);
        assert_eq!(target.parents[0].as_str(), repo.rev("HEAD"));
    }

    #[test]
    fn existing_branch_is_its_own_parent() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["branch", "side"]);
        repo.commit_file("a.txt", "a\n", "ahead on master");

        let target = engine::derive_target(&repo.git(), &Config::default(), Some("side")).unwrap();
        assert_eq!(target.refname.as_str(), "refs/heads/side");
        assert_eq!(target.parents[0].as_str(), repo.rev("side"));
    }

    #[test]
    fn unknown_branch_with_existing_branches_is_not_found() {
        let repo = TestRepo::new();
        let result = engine::derive_target(&repo.git(), &Config::default(), Some("nope"));
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn nothing_staged_creates_nothing() {
        let repo = TestRepo::new();
        let git = repo.git();
        let target = engine::derive_target(&git, &Config::default(), None).unwrap();
        let before = repo.rev("HEAD");

        let outcome = engine::create_commit(&git, target, "empty", &Identity::default()).unwrap();
        assert!(matches!(outcome, CommitOutcome::NothingStaged { .. }));
        assert_eq!(repo.rev("HEAD"), before);
    }

    #[test]
    fn first_commit_makes_head_born() {
        let repo = TestRepo::unborn();
        repo.write("a.txt", "a\n");
        let git = repo.git();
        engine::stage(&git, &files(&["a.txt"])).unwrap();

        let target = engine::derive_target(&git, &Config::default(), None).unwrap();
        let outcome = engine::create_commit(&git, target, "first", &Identity::default()).unwrap();

        let CommitOutcome::Created { id, target } = outcome else {
            panic!("expected a commit");
        };
        assert!(target.parents.is_empty());
        assert!(!git.head_is_unborn().unwrap());
        assert_eq!(repo.rev("HEAD"), id.as_str());
    }

    #[test]
    fn commit_to_another_branch_leaves_head_alone() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["branch", "side"]);
        let head_before = repo.rev("HEAD");
        repo.write("a.txt", "a\n");
        let git = repo.git();
        engine::stage(&git, &files(&["a.txt"])).unwrap();

        let target = engine::derive_target(&git, &Config::default(), Some("side")).unwrap();
        let outcome = engine::create_commit(&git, target, "on side", &Identity::default()).unwrap();

        assert!(matches!(outcome, CommitOutcome::Created { .. }));
        assert_eq!(repo.rev("master"), head_before);
        assert_ne!(repo.rev("side"), head_before);
    }
}

// =============================================================================
// Restore
// =============================================================================

mod restoring {
    use super::*;

    #[test]
    fn staged_restore_unstages_a_new_file() {
        let repo = TestRepo::new();
        repo.write("a.txt", "a\n");
        let git = repo.git();
        engine::stage(&git, &files(&["a.txt"])).unwrap();
        assert_eq!(
            status::head_vs_index(&git, None).unwrap().get("a.txt"),
            Some(FileStatus::New)
        );

        let outcome = engine::restore(&git, "HEAD", &files(&["a.txt"]), RestoreMode::Staged).unwrap();
        assert_eq!(outcome.index, vec!["a.txt"]);
        assert!(outcome.workdir.is_empty());
        assert!(!status::head_vs_index(&git, None).unwrap().contains("a.txt"));
        assert!(repo.path().join("a.txt").exists());
    }

    #[test]
    fn matching_file_restores_nothing() {
        let repo = TestRepo::new();
        let outcome = engine::restore(
            &repo.git(),
            "HEAD",
            &files(&["README.md"]),
            RestoreMode::Workdir,
        )
        .unwrap();
        assert!(!outcome.changed());
    }

    #[test]
    fn workdir_restore_resets_both_sides() {
        let repo = TestRepo::new();
        repo.write("README.md", "staged\n");
        run_git(repo.path(), &["add", "README.md"]);
        repo.write("README.md", "staged and then edited\n");
        let git = repo.git();

        let outcome = engine::restore(&git, "HEAD", &files(&["README.md"]), RestoreMode::Workdir)
            .unwrap();

        assert_eq!(outcome.workdir, vec!["README.md"]);
        assert_eq!(outcome.index, vec!["README.md"]);
        assert_eq!(repo.read("README.md"), "# Test Repo\n");
        assert!(status::head_vs_index(&git, None).unwrap().is_empty());
        assert!(status::index_vs_workdir(&git).unwrap().is_empty());
    }

    #[test]
    fn workdir_restore_brings_back_a_deleted_file() {
        let repo = TestRepo::new();
        std::fs::remove_file(repo.path().join("README.md")).unwrap();

        let outcome = engine::restore(
            &repo.git(),
            "HEAD",
            &files(&["README.md"]),
            RestoreMode::Workdir,
        )
        .unwrap();
        assert_eq!(outcome.workdir, vec!["README.md"]);
        assert!(outcome.index.is_empty());
        assert_eq!(repo.read("README.md"), "# Test Repo\n");
    }

    #[test]
    fn staged_restore_leaves_workdir_edits() {
        let repo = TestRepo::new();
        repo.write("README.md", "edited\n");
        run_git(repo.path(), &["add", "README.md"]);

        let outcome = engine::restore(
            &repo.git(),
            "HEAD",
            &files(&["README.md"]),
            RestoreMode::Staged,
        )
        .unwrap();
        assert_eq!(outcome.index, vec!["README.md"]);
        assert_eq!(repo.read("README.md"), "edited\n");
    }

    #[test]
    fn untracked_files_absent_from_source_are_removed() {
        let repo = TestRepo::new();
        repo.write("scratch.txt", "gone soon\n");
        let git = repo.git();

        let outcome =
            engine::restore(&git, "HEAD", &files(&["scratch.txt"]), RestoreMode::Workdir).unwrap();
        assert_eq!(outcome.workdir, vec!["scratch.txt"]);
        assert!(outcome.index.is_empty());
        assert!(!repo.path().join("scratch.txt").exists());

        let again =
            engine::restore(&git, "HEAD", &files(&["scratch.txt"]), RestoreMode::Workdir).unwrap();
        assert!(!again.changed());
    }

    #[test]
    fn ignored_files_are_removed_in_workdir_mode() {
        let repo = TestRepo::new();
        repo.commit_file(".gitignore", "*.log\n", "ignore logs");
        repo.write("build.log", "noise\n");

        let outcome = engine::restore(
            &repo.git(),
            "HEAD",
            &files(&["build.log"]),
            RestoreMode::Workdir,
        )
        .unwrap();
        assert_eq!(outcome.workdir, vec!["build.log"]);
        assert!(!repo.path().join("build.log").exists());
    }

    #[test]
    fn staged_mode_never_touches_untracked_files() {
        let repo = TestRepo::new();
        repo.write("scratch.txt", "keep me\n");

        let outcome = engine::restore(
            &repo.git(),
            "HEAD",
            &files(&["scratch.txt"]),
            RestoreMode::Staged,
        )
        .unwrap();
        assert!(!outcome.changed());
        assert_eq!(repo.read("scratch.txt"), "keep me\n");
    }

    #[test]
    fn restore_from_an_older_commit() {
        let repo = TestRepo::new();
        run_git(repo.path(), &["tag", "v1"]);
        repo.commit_file("README.md", "# Version two\n", "v2");

        let outcome = engine::restore(
            &repo.git(),
            "v1",
            &files(&["README.md"]),
            RestoreMode::Workdir,
        )
        .unwrap();
        assert_eq!(outcome.workdir, vec!["README.md"]);
        assert_eq!(outcome.index, vec!["README.md"]);
        assert_eq!(repo.read("README.md"), "# Test Repo\n");
    }

    #[test]
    fn unknown_source_is_not_found() {
        let repo = TestRepo::new();
        let result = engine::restore(
            &repo.git(),
            "no-such-ref",
            &files(&["README.md"]),
            RestoreMode::Staged,
        );
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }
}
