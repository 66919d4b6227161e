use test_driver::{run, DemoRun};

const TAIL: &str = env!("CARGO_BIN_EXE_demo-tail");
const GREP: &str = env!("CARGO_BIN_EXE_demo-grep");
const CAT: &str = env!("CARGO_BIN_EXE_demo-cat");
const CURL: &str = env!("CARGO_BIN_EXE_demo-curl");
const GIT: &str = env!("CARGO_BIN_EXE_demo-git");

#[test]
fn tail_numeric_shorthand() {
    let out = run(TAIL, &["-3", "app.log"], 0);
    assert_eq!(
        out.stdout,
        "lines=3\nfollow=false\nquiet=false\nfiles=[\"app.log\"]\n"
    );
    assert_eq!(out.stderr, "");
}

#[test]
fn tail_attached_values_and_clusters() {
    let out = run(TAIL, &["-n+3"], 0);
    assert!(out.stdout.starts_with("lines=3\n"), "{}", out.stdout);
    assert!(out.stdout.ends_with("files=[]\n"), "{}", out.stdout);

    let out = run(TAIL, &["-fq", "-n4", "a", "b"], 0);
    assert_eq!(
        out.stdout,
        "lines=4\nfollow=true\nquiet=true\nfiles=[\"a\", \"b\"]\n"
    );

    let out = run(TAIL, &["--lines", "11", "--", "-f"], 0);
    assert!(out.stdout.contains("lines=11\nfollow=false\n"), "{}", out.stdout);
    assert!(out.stdout.contains("files=[\"-f\"]"), "{}", out.stdout);
}

#[test]
fn unknown_flag_exits_2_with_usage() {
    let out = run(TAIL, &["-z"], 2);
    assert_eq!(out.stdout, "");
    assert!(
        out.stderr
            .starts_with("flag provided but not defined: -z\nUsage of tail:\n"),
        "{}",
        out.stderr
    );
    assert!(
        out.stderr
            .contains("  -n, --lines NUM\n    \toutput the last NUM lines (default 10)\n"),
        "{}",
        out.stderr
    );
}

#[test]
fn help_and_version_exit_0() {
    let out = run(TAIL, &["-h"], 0);
    assert_eq!(out.stdout, "");
    assert!(out.stderr.starts_with("Usage of tail:\n"), "{}", out.stderr);
    assert!(out.stderr.contains("  -h, --help\n"), "{}", out.stderr);

    let out = run(TAIL, &["--version"], 0);
    assert_eq!(out.stderr, "tail v0.1.0\n");

    let out = run(GREP, &["-h"], 0);
    assert!(
        out.stderr.starts_with("optflag demo\n\nUsage of grep:\n"),
        "{}",
        out.stderr
    );
}

#[test]
fn grep_value_clusters() {
    let out = run(GREP, &["-iA5", "needle", "hay.txt"], 0);
    assert!(out.stdout.contains("ignore-case=true\n"), "{}", out.stdout);
    assert!(out.stdout.contains("after-context=5\n"), "{}", out.stdout);
    assert!(
        out.stdout.contains("args=[\"needle\", \"hay.txt\"]"),
        "{}",
        out.stdout
    );

    let out = run(GREP, &["-vcA", "66", "-e", "a", "-eb"], 0);
    assert!(out.stdout.contains("invert-match=true\ncount=true\n"), "{}", out.stdout);
    assert!(out.stdout.contains("after-context=66\n"), "{}", out.stdout);
    assert!(out.stdout.contains("regexp=[\"a\", \"b\"]\n"), "{}", out.stdout);
}

#[test]
fn grep_value_errors() {
    let out = run(GREP, &["-A"], 2);
    assert!(
        out.stderr.starts_with("flag needs an argument: -A\n"),
        "{}",
        out.stderr
    );

    let out = run(GREP, &["-A", "x"], 2);
    assert!(
        out.stderr
            .starts_with("invalid value \"x\" for flag -A: parsing \"x\": invalid syntax\n"),
        "{}",
        out.stderr
    );

    let out = run(GREP, &["---i"], 2);
    assert!(out.stderr.starts_with("bad flag syntax: ---i\n"), "{}", out.stderr);
}

#[test]
fn cat_boolean_clusters() {
    let out = run(CAT, &["-vET", "notes.txt"], 0);
    assert_eq!(
        out.stdout,
        "E, show-ends\nT, show-tabs\nv, show-nonprinting\nfiles=[\"notes.txt\"]\n"
    );

    // Unknown letters inside a cluster are skipped once another one matches.
    let out = run(CAT, &["-mA"], 0);
    assert_eq!(out.stdout, "A, show-all\nfiles=[]\n");

    let out = run(CAT, &["-m"], 2);
    assert!(
        out.stderr.starts_with("flag provided but not defined: -m\n"),
        "{}",
        out.stderr
    );
}

#[test]
fn curl_greedy_headers_and_tag_defaults() {
    let out = run(
        CURL,
        &[
            "-H",
            "Accept: */*",
            "X-Trace: 1",
            "--url",
            "test.com",
            "-d",
            "a=1",
            "-d=b=2",
            "-v",
            "-m",
            "1m30s",
        ],
        0,
    );
    assert_eq!(
        out.stdout,
        "method=GET\n\
         url=test.com\n\
         headers=[\"Accept: */*\", \"X-Trace: 1\"]\n\
         data=[\"a=1\", \"b=2\"]\n\
         retry=0\n\
         verbose=true\n\
         connect-timeout=10s\n\
         max-time=90s\n\
         args=[]\n"
    );

    let out = run(CURL, &["-H", "-X", "PUT"], 2);
    assert!(
        out.stderr.starts_with("flag needs an argument: -H\n"),
        "{}",
        out.stderr
    );
}

#[test]
fn git_subcommands() {
    let out = run(GIT, &["add", "-vn", "src/main.rs"], 0);
    assert_eq!(
        out.stdout,
        "add verbose=true dry-run=true paths=[\"src/main.rs\"]\n"
    );

    let out = run(GIT, &["ci", "-am", "fix parser"], 0);
    assert_eq!(out.stdout, "commit all=true message=\"fix parser\"\n");

    let out = run(GIT, &["version"], 0);
    assert_eq!(out.stdout, "git version v0.1.0\n");

    let out = run(GIT, &["commit", "-a"], 1);
    assert_eq!(out.stdout, "");
    assert_eq!(out.stderr, "Aborting commit due to empty commit message.\n");

    let out = run(GIT, &["commit", "-q"], 2);
    assert!(
        out.stderr
            .starts_with("flag provided but not defined: -q\nUsage of git commit:\n"),
        "{}",
        out.stderr
    );
}

#[test]
fn git_unknown_and_help() {
    let listing = "Usage of git:\n\
                   \x20   add    Add file contents to the index\n\
                   \x20   ci, commit    Record changes to the repository\n\
                   \x20   version    Show version information\n";

    let out = run(GIT, &["push"], 2);
    assert_eq!(
        out.stderr,
        format!("subcommand provided but not defined: push\n{}", listing)
    );

    let out = run(GIT, &["--help"], 0);
    assert_eq!(out.stderr, listing);

    let out = run(GIT, &[], 1);
    assert_eq!(out.stderr, listing);
}

#[test]
fn trace_logging_goes_to_stderr() {
    let out = DemoRun::spawn(TAIL, &["-5"], &[("RUST_LOG", "optflag=trace")])
        .expect("failed to spawn demo-tail")
        .wait_exit(0);
    assert!(out.stdout.starts_with("lines=5\n"), "{}", out.stdout);
    assert!(out.stderr.contains("registered flag"), "{}", out.stderr);
    assert!(out.stderr.contains("matched"), "{}", out.stderr);
}
