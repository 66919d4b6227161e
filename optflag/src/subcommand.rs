//! `git`-style subcommand dispatch.

use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::split_name;

type Process = Box<dyn FnMut(&[String]) -> Result<()>>;

struct SubCommand {
    usage: String,
    process: Process,
}

/// Dispatches the first argument to a registered subcommand. Each
/// subcommand's callback receives the remaining arguments and typically
/// parses them with its own [`FlagSet`](crate::FlagSet).
pub struct ParentCommand {
    name: String,
    output: RefCell<Box<dyn Write>>,
    usage_hook: Option<Rc<dyn Fn(&ParentCommand)>>,
    commands: BTreeMap<String, SubCommand>,
    aliases: HashMap<String, String>,
    args: Vec<String>,
}

impl ParentCommand {
    pub fn new(name: &str) -> Self {
        ParentCommand {
            name: name.to_string(),
            output: RefCell::new(Box::new(io::stderr())),
            usage_hook: None,
            commands: BTreeMap::new(),
            aliases: HashMap::new(),
            args: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_output<W: Write + 'static>(&mut self, output: W) {
        self.output = RefCell::new(Box::new(output));
    }

    pub fn output(&self) -> RefMut<'_, Box<dyn Write>> {
        self.output.borrow_mut()
    }

    pub fn set_usage<F: Fn(&ParentCommand) + 'static>(&mut self, usage: F) {
        self.usage_hook = Some(Rc::new(usage));
    }

    /// Register a subcommand. `name` may list comma-separated aliases
    /// (`"rm, remove"`). A name that is already taken panics.
    pub fn sub_command<F>(&mut self, name: &str, usage: &str, process: F)
    where
        F: FnMut(&[String]) -> Result<()> + 'static,
    {
        let (key, aliases) = split_name(name);
        let taken = self.commands.contains_key(&key)
            || aliases.iter().any(|a| self.aliases.contains_key(a));
        if taken {
            let msg = if self.name.is_empty() {
                format!("subcommand redefined: {}", key)
            } else {
                format!("{} subcommand redefined: {}", self.name, key)
            };
            let _ = writeln!(self.output(), "{}", msg);
            panic!("{}", msg);
        }

        for alias in aliases {
            self.aliases.insert(alias, key.clone());
        }
        debug!(parent = %self.name, subcommand = %key, "registered subcommand");
        self.commands.insert(
            key,
            SubCommand {
                usage: usage.to_string(),
                process: Box::new(process),
            },
        );
    }

    /// Arguments passed to the last dispatched subcommand.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Dispatch on the first argument. Returns `Ok(false)` when there is
    /// nothing to dispatch.
    pub fn parse<S: AsRef<str>>(&mut self, arguments: &[S]) -> Result<bool> {
        let Some((first, rest)) = arguments.split_first() else {
            return Ok(false);
        };
        let first = first.as_ref();
        let name = first
            .strip_prefix("--")
            .or_else(|| first.strip_prefix('-'))
            .unwrap_or(first);

        let key = if self.commands.contains_key(name) {
            Some(name.to_string())
        } else {
            self.aliases.get(name).cloned()
        };
        let Some(key) = key else {
            if name == "h" || name == "help" {
                self.usage();
                return Err(Error::HelpRequested);
            }
            let err = Error::UnknownSubcommand(name.to_string());
            let _ = writeln!(self.output(), "{}", err);
            self.usage();
            return Err(err);
        };

        self.args = rest.iter().map(|a| a.as_ref().to_string()).collect();
        debug!(parent = %self.name, subcommand = %key, args = ?self.args, "dispatching");
        let args = self.args.clone();
        match self.commands.get_mut(&key) {
            Some(sub) => (sub.process)(&args)?,
            None => return Err(Error::UnknownSubcommand(key)),
        }
        Ok(true)
    }

    /// List subcommands sorted by name, one per line.
    pub fn print_defaults(&self) {
        let mut out = self.output();
        for (name, sub) in &self.commands {
            let _ = writeln!(out, "    {}    {}", name, sub.usage);
        }
    }

    pub fn default_usage(&self) {
        {
            let mut out = self.output();
            if self.name.is_empty() {
                let _ = writeln!(out, "Usage:");
            } else {
                let _ = writeln!(out, "Usage of {}:", self.name);
            }
        }
        self.print_defaults();
    }

    pub fn usage(&self) {
        match self.usage_hook.clone() {
            Some(hook) => hook(self),
            None => self.default_usage(),
        }
    }
}
