use assert_cmd::Command;
use assert_fs::TempDir;
use derive_new::new;
use rstest::fixture;
use std::path::Path;

/// Dates of the commits created by `linear_repository`, oldest first
pub const LINEAR_DATES: [&str; 3] = [
    "2023-01-02 09:00:00 +0100",
    "2023-01-03 10:00:00 +0100",
    "2023-01-04 11:00:00 +0100",
];

#[derive(Debug, Clone, new)]
pub struct RandomAuthor {
    pub name: String,
    pub email: String,
}

pub fn generate_random_author() -> RandomAuthor {
    use fake::Fake;
    use fake::faker::internet::en::FreeEmail;
    use fake::faker::name::en::Name;

    let name = Name().fake::<String>().replace(" ", "_");
    let email = FreeEmail().fake::<String>();
    RandomAuthor::new(name, email)
}

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Empty repository on `main` with a local identity configured
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_git_command(repository_dir.path(), &["init", "-q", "-b", "main"])
        .assert()
        .success();
    for (key, value) in [
        ("user.name", "fake_user"),
        ("user.email", "fake_email@email.com"),
        ("commit.gpgsign", "false"),
    ] {
        run_git_command(repository_dir.path(), &["config", key, value])
            .assert()
            .success();
    }

    repository_dir
}

/// Three commits on `main`: "First commit", "Second commit", "Third commit"
#[fixture]
pub fn linear_repository(init_repository_dir: TempDir) -> TempDir {
    let author = generate_random_author();
    for (i, (message, date)) in ["First commit", "Second commit", "Third commit"]
        .iter()
        .zip(LINEAR_DATES)
        .enumerate()
    {
        git_commit(
            init_repository_dir.path(),
            &format!("file{}.txt", i + 1),
            message,
            date,
            &author,
        );
    }

    init_repository_dir
}

pub fn run_chisel_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("chisel").expect("Failed to find chisel binary");
    cmd.envs(vec![("NO_PAGER", "1")]);
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn run_git_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

/// Write `file` and commit it with a fixed author, committer and date
pub fn git_commit(dir: &Path, file: &str, message: &str, date: &str, author: &RandomAuthor) {
    std::fs::write(dir.join(file), format!("{message}\n"))
        .unwrap_or_else(|e| panic!("Failed to write file {file:?}: {e}"));

    run_git_command(dir, &["add", file]).assert().success();
    run_git_command(dir, &["commit", "-q", "-m", message])
        .envs(vec![
            ("GIT_AUTHOR_NAME", author.name.as_str()),
            ("GIT_AUTHOR_EMAIL", author.email.as_str()),
            ("GIT_AUTHOR_DATE", date), // %Y-%m-%d %H:%M:%S %z
            ("GIT_COMMITTER_NAME", "fake_user"),
            ("GIT_COMMITTER_EMAIL", "fake_email@email.com"),
            ("GIT_COMMITTER_DATE", date),
        ])
        .assert()
        .success();
}

pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = run_git_command(dir, args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout)
        .expect("git output is not UTF-8")
        .trim_end()
        .to_string()
}

pub fn rev_parse(dir: &Path, revision: &str) -> String {
    git_output(dir, &["rev-parse", revision])
}

/// `git log --format=<format>` of `revision`, newest first
pub fn log_format(dir: &Path, revision: &str, format: &str) -> Vec<String> {
    git_output(dir, &["log", &format!("--format={format}"), revision])
        .lines()
        .map(str::to_string)
        .collect()
}

/// Full message of a single commit
pub fn commit_message(dir: &Path, revision: &str) -> String {
    git_output(dir, &["log", "-1", "--format=%B", revision])
}

/// Bare clone of `dir` registered as `origin`, with `main` tracking it
pub fn push_to_remote(dir: &Path, remote: &Path) {
    run_git_command(
        dir,
        &["init", "-q", "--bare", &remote.display().to_string()],
    )
    .assert()
    .success();
    run_git_command(
        dir,
        &["remote", "add", "origin", &remote.display().to_string()],
    )
    .assert()
    .success();
    run_git_command(dir, &["push", "-q", "-u", "origin", "main"])
        .assert()
        .success();
}
