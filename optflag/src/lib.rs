//! Command-line flag parsing: single- and double-dash flags with typed
//! values, extended with POSIX short-option clusters, greedy multi-value flags,
//! pattern flags, tag-driven registration and subcommands.
//!
//! ```no_run
//! use optflag::{ErrorHandling, FlagSet, Flags};
//!
//! let mut fs = FlagSet::new("grep", ErrorHandling::ExitOnError);
//! let ignore_case = fs
//!     .opt("i, ignore-case", "ignore case distinctions")
//!     .flags(Flags::POSIX_SHORT)
//!     .new_bool(false);
//! let after = fs
//!     .opt("A, after-context", "print NUM lines of trailing context")
//!     .flags(Flags::POSIX_SHORT)
//!     .new_int(0);
//!
//! fs.parse(&["-iA5", "pattern"]).unwrap();
//! assert!(ignore_case.get());
//! assert_eq!(after.get(), 5);
//! assert_eq!(fs.args(), ["pattern"]);
//! ```

mod binding;
pub mod command_line;
mod engine;
mod error;
mod flag;
mod flagset;
mod registry;
mod subcommand;
mod token;
mod usage;
mod value;

pub use binding::{parse_flags, BindFields, Binder, StructTag};
pub use error::{Error, Result};
pub use flag::{Flag, Flags, Opt, PatternOpt};
pub use flagset::{ErrorHandling, FlagSet};
pub use subcommand::ParentCommand;
pub use usage::unquote_usage;
pub use value::{FlagValue, Slot, Value, Var};
