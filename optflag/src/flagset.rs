//! The flag set: registration, queries, and the parse entry point.

use std::cell::{RefCell, RefMut};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::flag::{Flag, Flags, Opt, PatternOpt};
use crate::registry::{split_name, Registry};
use crate::value::{Slot, Value, Var};

/// What `parse` does when the command line is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorHandling {
    /// Return the error to the caller.
    #[default]
    ContinueOnError,
    /// Exit the process: status 2 on errors, 0 after `-h` or `-V`.
    ExitOnError,
    /// Panic on errors. Help and version requests are still returned.
    PanicOnError,
}

type UsageHook = Rc<dyn Fn(&FlagSet)>;

/// A set of defined flags.
///
/// A new set already holds the boolean flags `h, help` and `V, version`.
/// Both names are reserved: unless redefined, they print the usage text or
/// the version line and make `parse` return [`Error::HelpRequested`] or
/// [`Error::VersionRequested`].
pub struct FlagSet {
    name: String,
    version: String,
    author: String,
    error_handling: ErrorHandling,
    output: RefCell<Box<dyn Write>>,
    usage_hook: Option<UsageHook>,
    pub(crate) registry: Registry,
    pub(crate) posix_short: bool,
    pub(crate) actual: BTreeMap<String, Rc<Flag>>,
    args: Vec<String>,
    parsed: bool,
}

macro_rules! typed_shortcuts {
    ($($method:ident, $var_method:ident: $ty:ty;)*) => {
        $(
            pub fn $method(&mut self, name: &str, default: $ty, usage: &str) -> Var<$ty> {
                self.opt(name, usage).new_value(default)
            }

            pub fn $var_method(&mut self, var: &Var<$ty>, name: &str, default: $ty, usage: &str) {
                self.opt(name, usage).default_var(var, default);
            }
        )*
    };
}

impl FlagSet {
    pub fn new(name: &str, error_handling: ErrorHandling) -> Self {
        let mut set = FlagSet {
            name: name.to_string(),
            version: String::new(),
            author: String::new(),
            error_handling,
            output: RefCell::new(Box::new(io::stderr())),
            usage_hook: None,
            registry: Registry::default(),
            posix_short: false,
            actual: BTreeMap::new(),
            args: Vec::new(),
            parsed: false,
        };
        set.register(builtin("h, help", "display this help and exit"));
        set.register(builtin("V, version", "output version information and exit"));
        set
    }

    /// Reset the name and the error policy.
    pub fn init(&mut self, name: &str, error_handling: ErrorHandling) {
        self.name = name.to_string();
        self.error_handling = error_handling;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_handling(&self) -> ErrorHandling {
        self.error_handling
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    pub fn set_author(&mut self, author: &str) {
        self.author = author.to_string();
    }

    pub(crate) fn version_text(&self) -> &str {
        &self.version
    }

    pub(crate) fn author_text(&self) -> &str {
        &self.author
    }

    /// Destination for usage text and error messages. Defaults to stderr.
    pub fn set_output<W: Write + 'static>(&mut self, output: W) {
        self.output = RefCell::new(Box::new(output));
    }

    pub fn output(&self) -> RefMut<'_, Box<dyn Write>> {
        self.output.borrow_mut()
    }

    /// Replace the usage printer called on `-h` and after errors.
    pub fn set_usage<F: Fn(&FlagSet) + 'static>(&mut self, usage: F) {
        self.usage_hook = Some(Rc::new(usage));
    }

    pub(crate) fn usage_hook(&self) -> Option<UsageHook> {
        self.usage_hook.clone()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Start defining a flag. `name` may list several comma-separated
    /// aliases: `"n, lines"`.
    pub fn opt(&mut self, name: &str, usage: &str) -> Opt<'_> {
        Opt::new(self, name, usage)
    }

    /// Start defining a flag whose name is matched by a regular expression.
    pub fn pattern_opt(&mut self, def: PatternOpt) -> Opt<'_> {
        Opt::pattern(self, def)
    }

    /// Define a flag backed by a caller-implemented adapter.
    pub fn var<V: Value + 'static>(&mut self, value: V, name: &str, usage: &str) -> Rc<RefCell<V>> {
        self.opt(name, usage).custom(value)
    }

    typed_shortcuts! {
        bool, bool_var: bool;
        byte, byte_var: u8;
        int, int_var: i32;
        int64, int64_var: i64;
        uint, uint_var: usize;
        uint64, uint64_var: u64;
        float64, float64_var: f64;
        duration, duration_var: Duration;
        bool_slice, bool_slice_var: Vec<bool>;
        string_slice, string_slice_var: Vec<String>;
        int64_slice, int64_slice_var: Vec<i64>;
        duration_slice, duration_slice_var: Vec<Duration>;
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> Var<String> {
        self.opt(name, usage).new_string(default)
    }

    pub fn string_var(&mut self, var: &Var<String>, name: &str, default: &str, usage: &str) {
        self.opt(name, usage).default_var(var, default.to_string());
    }

    /// Add a flag to the tables. Conflicting names and contradictory
    /// bitmasks are programming errors and panic.
    pub(crate) fn register(&mut self, flag: Flag) {
        if flag.flags.contains(Flags::POSIX_SHORT | Flags::GREEDY_MODE) {
            panic!(
                "flag {}: POSIX_SHORT and GREEDY_MODE cannot be combined",
                flag.name
            );
        }
        let posix = flag.flags.contains(Flags::POSIX_SHORT);
        let name = flag.name.clone();
        let flags = flag.flags;
        if let Err(conflict) = self.registry.insert(flag) {
            let msg = if self.name.is_empty() {
                format!("flag redefined: {}", conflict)
            } else {
                format!("{} flag redefined: {}", self.name, conflict)
            };
            let _ = writeln!(self.output(), "{}", msg);
            panic!("{}", msg);
        }
        if posix {
            self.posix_short = true;
        }
        debug!(set = %self.name, flag = %name, ?flags, "registered flag");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Find a flag by display name or by any of its aliases.
    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.registry.get(name).map(|f| &**f)
    }

    /// Set a flag's value as if it had appeared on the command line.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let flag = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoSuchFlag(name.to_string()))?;
        flag.slot.set(value).map_err(|reason| Error::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            reason,
        })?;
        self.mark_seen(&flag);
        Ok(())
    }

    /// Whether the flag was set by a parse or by [`FlagSet::set`].
    pub fn is_set(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .is_some_and(|f| self.actual.contains_key(&f.name))
    }

    pub(crate) fn mark_seen(&mut self, flag: &Rc<Flag>) {
        self.actual.insert(flag.name.clone(), flag.clone());
    }

    /// Visit the flags that have been set, in name order.
    pub fn visit<F: FnMut(&Flag)>(&self, mut f: F) {
        for flag in self.actual.values() {
            f(flag);
        }
    }

    /// Visit every defined flag, in name order.
    pub fn visit_all<F: FnMut(&Flag)>(&self, mut f: F) {
        for flag in self.registry.iter() {
            f(flag);
        }
    }

    /// Number of flags that have been set.
    pub fn n_flag(&self) -> usize {
        self.actual.len()
    }

    /// Positional argument `i` left after parsing.
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    pub fn n_arg(&self) -> usize {
        self.args.len()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse `arguments` (without the program name). Afterwards the bound
    /// variables hold the parsed values and [`FlagSet::args`] the
    /// positional arguments.
    pub fn parse<S: AsRef<str>>(&mut self, arguments: &[S]) -> Result<()> {
        self.parsed = true;
        let args = arguments.iter().map(|a| a.as_ref().to_string()).collect();
        match self.run(args) {
            Ok(()) => Ok(()),
            Err(err) => self.apply_policy(err),
        }
    }

    fn apply_policy(&self, err: Error) -> Result<()> {
        match self.error_handling {
            ErrorHandling::ContinueOnError => Err(err),
            ErrorHandling::ExitOnError => {
                let _ = self.output().flush();
                std::process::exit(if err.is_help_or_version() { 0 } else { 2 });
            }
            ErrorHandling::PanicOnError if err.is_help_or_version() => Err(err),
            ErrorHandling::PanicOnError => panic!("{}", err),
        }
    }

    pub(crate) fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }
}

impl Default for FlagSet {
    fn default() -> Self {
        FlagSet::new("", ErrorHandling::ContinueOnError)
    }
}

fn builtin(name: &str, usage: &str) -> Flag {
    let (name, aliases) = split_name(name);
    Flag {
        name,
        aliases,
        usage: usage.to_string(),
        def_value: "false".to_string(),
        slot: Slot::Bool(Var::new(false)),
        flags: Flags::NONE,
        fixed: None,
        pattern: None,
        builtin: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SharedBuf;

    #[test]
    fn builtins_are_registered() {
        let fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
        let mut names = Vec::new();
        fs.visit_all(|f| names.push(f.name().to_string()));
        assert_eq!(names, ["V, version", "h, help"]);
        assert_eq!(fs.n_flag(), 0);
        assert!(!fs.parsed());
    }

    #[test]
    fn shortcuts_bind_variables() {
        let mut fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
        let verbose = fs.bool("verbose", false, "log more");
        let level = Var::new(0i32);
        fs.int_var(&level, "level", 3, "level");
        let name = fs.string("name", "x", "a name");
        assert_eq!(level.get(), 3);

        fs.parse(&["-verbose", "--level=7", "-name", "y", "rest"]).unwrap();
        assert!(verbose.get());
        assert_eq!(level.get(), 7);
        assert_eq!(name.get(), "y");
        assert_eq!(fs.args(), ["rest"]);
        assert_eq!(fs.arg(0), Some("rest"));
        assert_eq!(fs.arg(1), None);
        assert_eq!(fs.n_arg(), 1);
        assert_eq!(fs.n_flag(), 3);
        assert!(fs.parsed());
    }

    #[test]
    fn set_and_is_set() {
        let mut fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
        let count = fs.uint("c, count", 1, "count");
        assert!(!fs.is_set("count"));

        fs.set("count", "0x10").unwrap();
        assert_eq!(count.get(), 16);
        assert!(fs.is_set("c"));
        assert!(fs.is_set("c, count"));

        assert_eq!(fs.set("nope", "1"), Err(Error::NoSuchFlag("nope".into())));
        let err = fs.set("count", "-1").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }), "{:?}", err);

        let mut seen = Vec::new();
        fs.visit(|f| seen.push(f.name().to_string()));
        assert_eq!(seen, ["c, count"]);
    }

    #[test]
    fn redefinition_panics_with_message() {
        let buf = SharedBuf::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
            fs.set_output(buf.clone());
            let _ = fs.bool("x", false, "first");
            let _ = fs.bool("x", false, "second");
        }));
        assert!(result.is_err());
        assert_eq!(buf.contents(), "demo flag redefined: x\n");
    }

    #[test]
    fn reserved_names_can_be_redefined() {
        let mut fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
        let help = fs.bool("help", false, "custom help");
        fs.parse(&["-help"]).unwrap();
        assert!(help.get());

        let err = fs.parse(&["-h"]).unwrap_err();
        assert_eq!(err, Error::HelpRequested);
    }

    #[test]
    #[should_panic(expected = "cannot be combined")]
    fn posix_and_greedy_conflict() {
        let mut fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
        let _ = fs
            .opt("H", "header")
            .flags(Flags::POSIX | Flags::GREEDY)
            .new_string_slice(Vec::new());
    }

    #[test]
    #[should_panic(expected = "flag provided but not defined: -z")]
    fn panic_policy() {
        let mut fs = FlagSet::new("demo", ErrorHandling::PanicOnError);
        fs.set_output(SharedBuf::default());
        let _ = fs.parse(&["-z"]);
    }

    #[test]
    fn panic_policy_returns_help() {
        let mut fs = FlagSet::new("demo", ErrorHandling::PanicOnError);
        fs.set_output(SharedBuf::default());
        assert_eq!(fs.parse(&["-V"]), Err(Error::VersionRequested));
    }

    #[test]
    fn init_renames() {
        let mut fs = FlagSet::default();
        assert_eq!(fs.name(), "");
        fs.init("renamed", ErrorHandling::PanicOnError);
        assert_eq!(fs.name(), "renamed");
        assert_eq!(fs.error_handling(), ErrorHandling::PanicOnError);
    }
}
