// `grep`-style POSIX clusters: `-iA5`, `-iA 5`, `-vc`.

use optflag::{ErrorHandling, FlagSet, Flags, Result};

fn main() {
    test_driver::init_tracing();
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut fs = FlagSet::new("grep", ErrorHandling::ExitOnError)
        .version("v0.1.0")
        .author("optflag demo");
    let ignore_case = fs
        .opt("i, ignore-case", "ignore case distinctions")
        .flags(Flags::POSIX_SHORT)
        .new_bool(false);
    let invert = fs
        .opt("v, invert-match", "select non-matching lines")
        .flags(Flags::POSIX_SHORT)
        .new_bool(false);
    let count = fs
        .opt("c, count", "print only a count of selected lines")
        .flags(Flags::POSIX_SHORT)
        .new_bool(false);
    let after = fs
        .opt("A, after-context", "print `NUM` lines of trailing context")
        .flags(Flags::POSIX_SHORT)
        .new_int(0);
    let patterns = fs
        .opt("e, regexp", "use `PATTERN` for matching")
        .flags(Flags::POSIX_SHORT)
        .new_string_slice(Vec::new());

    let args: Vec<String> = std::env::args().skip(1).collect();
    fs.parse(&args)?;

    println!("ignore-case={}", ignore_case.get());
    println!("invert-match={}", invert.get());
    println!("count={}", count.get());
    println!("after-context={}", after.get());
    println!("regexp={:?}", patterns.get());
    println!("args={:?}", fs.args());
    Ok(())
}
