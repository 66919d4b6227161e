// `git`-style subcommands, each parsing its own flag set.

use optflag::{Error, ErrorHandling, FlagSet, Flags, ParentCommand, Result};

fn main() {
    test_driver::init_tracing();
    match run() {
        Ok(()) => {}
        Err(Error::HelpRequested) => {}
        // Already reported together with the usage text.
        Err(Error::UnknownSubcommand(_)) => std::process::exit(2),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn add(args: &[String]) -> Result<()> {
    let mut fs = FlagSet::new("git add", ErrorHandling::ExitOnError);
    let verbose = fs.opt("v, verbose", "be verbose").flags(Flags::POSIX).new_bool(false);
    let dry_run = fs.opt("n, dry-run", "dry run").flags(Flags::POSIX).new_bool(false);
    fs.parse(args)?;
    println!("add verbose={} dry-run={} paths={:?}", verbose.get(), dry_run.get(), fs.args());
    Ok(())
}

fn commit(args: &[String]) -> Result<()> {
    let mut fs = FlagSet::new("git commit", ErrorHandling::ExitOnError);
    let message = fs
        .opt("m, message", "use the given `MSG` as the commit message")
        .flags(Flags::POSIX)
        .new_string("");
    let all = fs.opt("a, all", "commit all changed files").flags(Flags::POSIX).new_bool(false);
    fs.parse(args)?;
    if message.borrow().is_empty() {
        return Err(Error::Callback(
            "Aborting commit due to empty commit message.".to_string(),
        ));
    }
    println!("commit all={} message={:?}", all.get(), message.get());
    Ok(())
}

fn run() -> Result<()> {
    let mut parent = ParentCommand::new("git");
    parent.sub_command("add", "Add file contents to the index", add);
    parent.sub_command("ci, commit", "Record changes to the repository", commit);
    parent.sub_command("version", "Show version information", |_| {
        println!("git version v0.1.0");
        Ok(())
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !parent.parse(&args)? {
        parent.usage();
        std::process::exit(1);
    }
    tracing::debug!(args = ?parent.args(), "subcommand finished");
    Ok(())
}
