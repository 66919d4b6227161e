//! The process-wide default flag set, named after `argv[0]` and using
//! [`ErrorHandling::ExitOnError`].

use std::cell::RefCell;

use crate::binding::BindFields;
use crate::error::Result;
use crate::flagset::{ErrorHandling, FlagSet};

thread_local! {
    static COMMAND_LINE: RefCell<Option<FlagSet>> = const { RefCell::new(None) };
}

fn program_name() -> String {
    std::env::args().next().unwrap_or_default()
}

/// Run `f` on the default flag set, creating it on first use.
pub fn with<R>(f: impl FnOnce(&mut FlagSet) -> R) -> R {
    COMMAND_LINE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let set = slot.get_or_insert_with(|| FlagSet::new(&program_name(), ErrorHandling::ExitOnError));
        f(set)
    })
}

/// Parse the process arguments (without the program name).
pub fn parse() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    with(|set| set.parse(&args))
}

/// Register `fields` on the default set and parse the process arguments.
pub fn parse_struct(fields: &dyn BindFields) -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    with(|set| set.parse_struct(&args, fields))
}

/// Positional arguments left by the last [`parse`].
pub fn args() -> Vec<String> {
    with(|set| set.args().to_vec())
}
