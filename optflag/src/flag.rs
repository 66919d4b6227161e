//! Flag definitions and the `Opt` registration builder.

use std::cell::RefCell;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;
use std::time::Duration;

use regex::Regex;

use crate::flagset::FlagSet;
use crate::registry::split_name;
use crate::value::{FlagValue, Slot, Value, Var};

// ============================================================================
// Flags: behavioral bitmask
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Single-letter aliases may be bundled: `-xyz`, `-n4`.
    pub const POSIX_SHORT: Flags = Flags(1);
    /// Consume every following non-flag token as a separate value.
    pub const GREEDY_MODE: Flags = Flags(1 << 1);
    /// When matched through the pattern, the token itself is the value.
    pub const REGEX_KEY_IS_VALUE: Flags = Flags(1 << 2);
    /// On match, assign the value registered with `match_var`.
    pub const NOT_VALUE: Flags = Flags(1 << 3);

    pub const POSIX: Flags = Flags::POSIX_SHORT;
    pub const GREEDY: Flags = Flags::GREEDY_MODE;

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 4] = [
            (Flags::POSIX_SHORT, "POSIX_SHORT"),
            (Flags::GREEDY_MODE, "GREEDY_MODE"),
            (Flags::REGEX_KEY_IS_VALUE, "REGEX_KEY_IS_VALUE"),
            (Flags::NOT_VALUE, "NOT_VALUE"),
        ];
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join(" | "))
    }
}

// ============================================================================
// Flag: one registered option
// ============================================================================

/// A registered flag. Immutable after registration; only the bound
/// variable changes while parsing.
pub struct Flag {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) usage: String,
    pub(crate) def_value: String,
    pub(crate) slot: Slot,
    pub(crate) flags: Flags,
    pub(crate) fixed: Option<Rc<dyn Fn()>>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) builtin: bool,
}

impl Flag {
    /// Display name: every alias, shortest first, joined with `", "`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Default value as text, captured at registration.
    pub fn def_value(&self) -> &str {
        &self.def_value
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Current value of the bound variable, rendered as text.
    pub fn value(&self) -> String {
        self.slot.render()
    }

    pub fn type_name(&self) -> String {
        self.slot.type_name()
    }

    pub fn is_bool_flag(&self) -> bool {
        self.slot.is_bool_flag()
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("def_value", &self.def_value)
            .field("flags", &self.flags)
            .field("pattern", &self.pattern())
            .finish()
    }
}

// ============================================================================
// PatternOpt: a flag whose name is a regular expression
// ============================================================================

/// Definition of a pattern flag: any token name matching `regex` resolves
/// to it, in addition to the explicit `short` and `long` aliases.
#[derive(Debug, Clone, Default)]
pub struct PatternOpt {
    pub regex: String,
    pub short: Vec<String>,
    pub long: Vec<String>,
    pub usage: String,
}

// ============================================================================
// Opt: registration builder
// ============================================================================

/// Builder returned by [`FlagSet::opt`]. Chain [`Opt::flags`] and finish
/// with one of the `new_*`, `var`, `match_var` or `custom` calls.
pub struct Opt<'a> {
    set: &'a mut FlagSet,
    name: String,
    usage: String,
    flags: Flags,
    regex: Option<String>,
}

macro_rules! typed_news {
    ($($method:ident: $ty:ty;)*) => {
        $(
            pub fn $method(self, default: $ty) -> Var<$ty> {
                self.new_value(default)
            }
        )*
    };
}

impl<'a> Opt<'a> {
    pub(crate) fn new(set: &'a mut FlagSet, name: &str, usage: &str) -> Self {
        Opt {
            set,
            name: name.to_string(),
            usage: usage.to_string(),
            flags: Flags::NONE,
            regex: None,
        }
    }

    pub(crate) fn pattern(set: &'a mut FlagSet, def: PatternOpt) -> Self {
        let names: Vec<&str> = def
            .short
            .iter()
            .chain(def.long.iter())
            .map(String::as_str)
            .collect();
        let name = if names.is_empty() {
            def.regex.clone()
        } else {
            names.join(",")
        };
        Opt {
            set,
            name,
            usage: def.usage,
            flags: Flags::NONE,
            regex: Some(def.regex),
        }
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    /// Register a flag bound to a fresh variable holding `default`.
    pub fn new_value<T: FlagValue>(self, default: T) -> Var<T> {
        let var = Var::new(default);
        self.install(T::into_slot(var.clone()), None);
        var
    }

    typed_news! {
        new_bool: bool;
        new_byte: u8;
        new_int: i32;
        new_int64: i64;
        new_uint: usize;
        new_uint64: u64;
        new_float64: f64;
        new_duration: Duration;
        new_bool_slice: Vec<bool>;
        new_string_slice: Vec<String>;
        new_int64_slice: Vec<i64>;
        new_duration_slice: Vec<Duration>;
    }

    pub fn new_string(self, default: &str) -> Var<String> {
        self.new_value(default.to_string())
    }

    /// Bind an existing variable; its current value is the default.
    pub fn var<T: FlagValue>(self, var: &Var<T>) {
        self.install(T::into_slot(var.clone()), None);
    }

    pub fn default_var<T: FlagValue>(self, var: &Var<T>, default: T) {
        var.set(default);
        self.var(var);
    }

    /// Bind `var` so that matching the flag assigns `value` without
    /// consuming any value text.
    pub fn match_var<T: FlagValue>(mut self, var: &Var<T>, value: T) {
        self.flags |= Flags::NOT_VALUE;
        let target = var.clone();
        let fixed: Rc<dyn Fn()> = Rc::new(move || target.set(value.clone()));
        self.install(T::into_slot(var.clone()), Some(fixed));
    }

    /// Register a caller-implemented adapter. The returned handle is shared
    /// with the flag.
    pub fn custom<V: Value + 'static>(self, value: V) -> Rc<RefCell<V>> {
        let value = Rc::new(RefCell::new(value));
        self.install(Slot::Custom(value.clone()), None);
        value
    }

    fn install(self, slot: Slot, fixed: Option<Rc<dyn Fn()>>) {
        let (name, aliases) = split_name(&self.name);
        let pattern = self.regex.as_deref().map(|re| {
            Regex::new(re).unwrap_or_else(|e| panic!("invalid flag pattern {:?}: {}", re, e))
        });
        let flag = Flag {
            name,
            aliases,
            usage: self.usage,
            def_value: slot.render(),
            slot,
            flags: self.flags,
            fixed,
            pattern,
            builtin: false,
        };
        self.set.register(flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flagset::ErrorHandling;

    #[test]
    fn bitmask() {
        let f = Flags::POSIX | Flags::REGEX_KEY_IS_VALUE;
        assert!(f.contains(Flags::POSIX_SHORT));
        assert!(f.contains(Flags::REGEX_KEY_IS_VALUE));
        assert!(!f.contains(Flags::GREEDY));
        assert!(Flags::NONE.is_empty());
        assert_eq!(format!("{:?}", f), "POSIX_SHORT | REGEX_KEY_IS_VALUE");
        assert_eq!(format!("{:?}", Flags::NONE), "NONE");

        let mut g = Flags::NONE;
        g |= Flags::GREEDY_MODE;
        assert_eq!(g, Flags::GREEDY);
        assert_eq!(g.bits(), 2);
    }

    #[test]
    fn registration_captures_metadata() {
        let mut fs = FlagSet::new("test", ErrorHandling::ContinueOnError);
        let _ = fs.opt("lines, n", "number of lines").new_int(10);
        let flag = fs.lookup("lines").unwrap();
        assert_eq!(flag.name(), "n, lines");
        assert_eq!(flag.aliases(), ["n", "lines"]);
        assert_eq!(flag.usage(), "number of lines");
        assert_eq!(flag.def_value(), "10");
        assert_eq!(flag.type_name(), "int");
        assert!(fs.lookup("n").is_some());
    }

    #[test]
    fn var_uses_current_value_as_default() {
        let mut fs = FlagSet::new("test", ErrorHandling::ContinueOnError);
        let port = Var::new(8080u64);
        fs.opt("port", "listen port").var(&port);
        assert_eq!(fs.lookup("port").unwrap().def_value(), "8080");

        let name = Var::new(String::new());
        fs.opt("name", "user name").default_var(&name, "guest".to_string());
        assert_eq!(name.get(), "guest");
        assert_eq!(fs.lookup("name").unwrap().def_value(), "guest");
    }

    #[test]
    fn pattern_opt_name() {
        let mut fs = FlagSet::new("tail", ErrorHandling::ContinueOnError);
        let _ = fs
            .pattern_opt(PatternOpt {
                regex: r"^\d+$".into(),
                short: vec!["n".into()],
                long: vec!["lines".into()],
                usage: "print NUM lines".into(),
            })
            .new_int(0);
        let flag = fs.lookup("lines").unwrap();
        assert_eq!(flag.name(), "n, lines");
        assert_eq!(flag.pattern(), Some(r"^\d+$"));
    }

    #[test]
    #[should_panic(expected = "invalid flag pattern")]
    fn bad_pattern_panics() {
        let mut fs = FlagSet::new("bad", ErrorHandling::ContinueOnError);
        let _ = fs
            .pattern_opt(PatternOpt {
                regex: "(".into(),
                ..PatternOpt::default()
            })
            .new_bool(false);
    }
}
