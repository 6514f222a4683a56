use assert_fs::TempDir;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Weekday};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::command::{
    commit_message, linear_repository, log_format, rev_parse, run_chisel_command,
    run_git_command,
};

#[rstest]
fn log_oneline_marks_local_commits(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = run_chisel_command(linear_repository.path(), &["log", "--oneline"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone())?;

    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("(local) Third commit"));
    assert!(lines[2].ends_with("(local) First commit"));

    let short = &rev_parse(linear_repository.path(), "main")[..7];
    assert!(lines[0].starts_with(short));

    Ok(())
}

#[rstest]
fn log_medium_shows_both_identities(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let author = log_format(linear_repository.path(), "main", "%an <%ae>")[0].clone();

    run_chisel_command(linear_repository.path(), &["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Author:     {author}")))
        .stdout(predicate::str::contains(
            "Commit:     fake_user <fake_email@email.com>",
        ))
        .stdout(predicate::str::contains("AuthorDate: Wed Jan 04 11:00:00 2023 +0100"))
        .stdout(predicate::str::contains("    Second commit"));

    Ok(())
}

#[rstest]
fn log_applies_filters(linear_repository: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_chisel_command(
        linear_repository.path(),
        &["log", "--oneline", "--match-message", "^(First|Third)"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("First commit"))
    .stdout(predicate::str::contains("Third commit"))
    .stdout(predicate::str::contains("Second commit").not());

    run_chisel_command(
        linear_repository.path(),
        &["log", "--oneline", "--after", "2023-01-03 12:00:00 +0100"],
    )
    .assert()
    .success()
    .stdout(predicate::str::is_match(r"^[0-9a-f]{7} \(local\) Third commit\n$")?);

    Ok(())
}

#[rstest]
fn log_filters_on_the_committed_date(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();
    run_chisel_command(
        dir,
        &["edit", "main~2", "--commit-date", "2023-06-01 10:00:00 +0100"],
    )
    .assert()
    .success();

    let after = ["log", "--oneline", "--after", "2023-05-01 00:00:00 +0100"];
    run_chisel_command(dir, &after)
        .assert()
        .success()
        .stdout("");

    run_chisel_command(dir, &[&after[..], &["--date-column", "committed"][..]].concat())
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9a-f]{7} \(local\) First commit\n$")?);

    Ok(())
}

#[rstest]
fn branches_marks_the_checked_out_branch(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();
    run_git_command(dir, &["branch", "feature/x", "main~1"])
        .assert()
        .success();

    let main = &rev_parse(dir, "main")[..7];
    let feature = &rev_parse(dir, "main~1")[..7];

    run_chisel_command(dir, &["branches"])
        .assert()
        .success()
        .stdout(format!("  feature/x {feature}\n* main {main}\n"));

    Ok(())
}

#[rstest]
fn directory_flag_selects_the_repository(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let elsewhere = TempDir::new()?;
    let path = linear_repository.path().display().to_string();

    run_chisel_command(elsewhere.path(), &["-C", &path, "log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("First commit"));

    Ok(())
}

#[rstest]
fn edit_dry_run_prints_the_plan_without_rewriting(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();
    let head = rev_parse(dir, "main");

    run_chisel_command(
        dir,
        &["edit", "main~1", "--message", "Reworded (again)", "--dry-run"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("2 commit(s) to rewrite, 1 modified"))
    .stdout(predicate::str::contains("--commit-filter:"))
    .stdout(predicate::str::contains("--env-filter:").not())
    .stdout(predicate::str::contains("git filter-branch --commit-filter"));

    assert_eq!(rev_parse(dir, "main"), head);

    Ok(())
}

#[rstest]
fn edit_rewrites_the_selected_commit(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();

    run_chisel_command(
        dir,
        &[
            "edit",
            "main",
            "--author",
            "Jane Doe <jane@example.com>",
            "--message",
            "It's $done",
        ],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("rewrote main"));

    assert_eq!(
        log_format(dir, "main", "%an <%ae>")[0],
        "Jane Doe <jane@example.com>"
    );
    assert_eq!(commit_message(dir, "main"), "It's $done");
    assert_eq!(commit_message(dir, "main~1"), "Second commit");

    Ok(())
}

#[rstest]
fn edit_selects_commits_by_filter(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();

    run_chisel_command(
        dir,
        &[
            "edit",
            "--match-message",
            "^(First|Second)",
            "--committer",
            "Release Bot <bot@example.com>",
        ],
    )
    .assert()
    .success();

    assert_eq!(
        log_format(dir, "main", "%cn"),
        vec!["fake_user", "Release Bot", "Release Bot"]
    );

    Ok(())
}

#[rstest]
fn edit_without_values_fails(linear_repository: TempDir) {
    run_chisel_command(linear_repository.path(), &["edit", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to edit"));
}

#[rstest]
fn edit_of_a_foreign_commit_fails(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();
    run_git_command(dir, &["checkout", "-q", "--orphan", "other"])
        .assert()
        .success();
    run_git_command(dir, &["commit", "-q", "-m", "Unrelated"])
        .assert()
        .success();

    run_chisel_command(dir, &["edit", "main", "--message", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not part of branch other"));

    Ok(())
}

#[rstest]
fn reorder_spreads_dates_over_the_domain(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();

    run_chisel_command(
        dir,
        &[
            "reorder",
            "--from",
            "2024-03-04",
            "--to",
            "2024-03-16",
            "--hours",
            "09:00-12:00",
            "--hours",
            "13:00-17:00",
            "--weekdays",
            "workdays",
            "--utc-offset",
            "+0100",
            "--seed",
            "7",
        ],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("main: 3 commit(s) redistributed"))
    .stdout(predicate::str::contains("rewrote main"));

    let first_day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let last_day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    let mut authored = log_format(dir, "main", "%aI|%cI")
        .iter()
        .map(|line| {
            let (author, committer) = line.split_once('|').unwrap();
            assert_eq!(author, committer);
            DateTime::parse_from_rfc3339(author).unwrap()
        })
        .collect::<Vec<_>>();
    authored.reverse();

    assert_eq!(authored.len(), 3);
    assert!(authored.windows(2).all(|pair| pair[0] <= pair[1]));
    for date in &authored {
        // the commits were recorded in +0100, the offset of the domain
        assert_eq!(date.offset().local_minus_utc(), 3600);
        assert!((first_day..=last_day).contains(&date.date_naive()));
        assert!(!matches!(date.weekday(), Weekday::Sat | Weekday::Sun));

        let time = date.time();
        let morning = NaiveTime::from_hms_opt(9, 0, 0).unwrap()
            ..NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let afternoon = NaiveTime::from_hms_opt(13, 0, 0).unwrap()
            ..NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(morning.contains(&time) || afternoon.contains(&time));
    }

    Ok(())
}

#[rstest]
fn reorder_with_an_empty_domain_fails(linear_repository: TempDir) {
    run_chisel_command(
        linear_repository.path(),
        &[
            "reorder",
            "--from",
            "2024-03-09",
            "--to",
            "2024-03-11",
            "--weekdays",
            "workdays",
        ],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("admits no time window"));
}

#[rstest]
fn reorder_of_two_branches_writes_one_replay_script_each(
    linear_repository: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = linear_repository.path();
    run_git_command(dir, &["branch", "feature/x", "main~1"])
        .assert()
        .success();
    run_git_command(dir, &["branch", "feature-x", "main~2"])
        .assert()
        .success();

    run_chisel_command(
        dir,
        &[
            "reorder",
            "-b",
            "feature/x",
            "-b",
            "feature-x",
            "--from",
            "2024-03-04",
            "--to",
            "2024-03-09",
            "--seed",
            "3",
            "--replay-script",
        ],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("rewrote feature/x"))
    .stdout(predicate::str::contains("rewrote feature-x"));

    let slashed = std::fs::read_to_string(dir.join("chisel-replay-feature%2Fx.sh"))?;
    let dashed = std::fs::read_to_string(dir.join("chisel-replay-feature-x.sh"))?;
    assert!(slashed.contains("refs/heads/feature/x"));
    assert!(dashed.contains("refs/heads/feature-x"));
    assert!(!dir.join("chisel-replay.sh").exists());

    let git_dir = dir.join(".git");
    assert!(!git_dir.join("chisel-feature%2Fx.lock").exists());
    assert!(!git_dir.join("chisel-feature-x.lock").exists());

    Ok(())
}
