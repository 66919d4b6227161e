// `tail`-style flags: `-3` is shorthand for `-n 3`.

use optflag::{ErrorHandling, FlagSet, Flags, PatternOpt, Result};

fn main() {
    test_driver::init_tracing();
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut fs = FlagSet::new("tail", ErrorHandling::ExitOnError).version("v0.1.0");
    let lines = fs
        .pattern_opt(PatternOpt {
            regex: r"^\d+$".to_string(),
            short: vec!["n".to_string()],
            long: vec!["lines".to_string()],
            usage: "output the last `NUM` lines".to_string(),
        })
        .flags(Flags::REGEX_KEY_IS_VALUE | Flags::POSIX_SHORT)
        .new_int(10);
    let follow = fs
        .opt("f, follow", "output appended data as the file grows")
        .flags(Flags::POSIX_SHORT)
        .new_bool(false);
    let quiet = fs
        .opt("q, quiet", "never output headers giving file names")
        .flags(Flags::POSIX_SHORT)
        .new_bool(false);

    let args: Vec<String> = std::env::args().skip(1).collect();
    fs.parse(&args)?;
    tracing::debug!(set = fs.n_flag(), "parsed");

    println!("lines={}", lines.get());
    println!("follow={}", follow.get());
    println!("quiet={}", quiet.get());
    println!("files={:?}", fs.args());
    Ok(())
}
