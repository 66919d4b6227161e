// `cat`-style boolean clusters on the default command line.

use optflag::{command_line, Flags, Result};

const OPTIONS: [(&str, &str); 8] = [
    ("A, show-all", "equivalent to -vET"),
    ("b, number-nonblank", "number nonempty output lines, overrides -n"),
    ("E, show-ends", "display $ at end of each line"),
    ("n, number", "number all output lines"),
    ("s, squeeze-blank", "suppress repeated empty output lines"),
    ("T, show-tabs", "display TAB characters as ^I"),
    ("u", "(ignored)"),
    ("v, show-nonprinting", "use ^ and M- notation, except for LFD and TAB"),
];

fn main() {
    test_driver::init_tracing();
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let vars = command_line::with(|fs| {
        fs.set_version("v0.1.0");
        OPTIONS
            .iter()
            .map(|(name, usage)| {
                let var = fs.opt(name, usage).flags(Flags::POSIX_SHORT).new_bool(false);
                (*name, var)
            })
            .collect::<Vec<_>>()
    });
    command_line::parse()?;

    for (name, var) in &vars {
        if var.get() {
            println!("{}", name);
        }
    }
    println!("files={:?}", command_line::args());
    Ok(())
}
