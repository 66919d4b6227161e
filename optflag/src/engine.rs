//! The parse loop: token matching and value dispatch.

use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::flag::{Flag, Flags};
use crate::flagset::FlagSet;
use crate::registry::{Lookup, Sentinel};
use crate::token::{classify, is_positional, Token};

/// Cursor over one `parse` call's arguments.
struct Session {
    pending: VecDeque<String>,
    positional: Vec<String>,
}

impl Session {
    fn new(args: Vec<String>) -> Self {
        Session {
            pending: args.into(),
            positional: Vec::new(),
        }
    }

    fn take(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    fn peek(&self) -> Option<&str> {
        self.pending.front().map(String::as_str)
    }

    /// Positional arguments in order, followed by whatever was not reached.
    fn into_args(self) -> Vec<String> {
        let mut args = self.positional;
        args.extend(self.pending);
        args
    }
}

impl FlagSet {
    /// Consume `args`, leaving the positional arguments in `self.args`.
    /// Failures are reported on the output sink before being returned.
    pub(crate) fn run(&mut self, args: Vec<String>) -> Result<()> {
        let mut session = Session::new(args);
        let outcome = loop {
            match self.parse_one(&mut session) {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        self.set_args(session.into_args());
        if let Err(err) = &outcome {
            if !err.is_help_or_version() {
                self.fail(err);
            }
        }
        outcome
    }

    /// Handle one token. `Ok(false)` means there is nothing left to parse.
    fn parse_one(&mut self, session: &mut Session) -> Result<bool> {
        let Some(arg) = session.take() else {
            return Ok(false);
        };
        let token = classify(&arg)?;
        trace!(arg = %arg, ?token, "classified");
        match token {
            Token::Terminator => Ok(false),
            Token::Positional => {
                session.positional.push(arg);
                Ok(true)
            }
            Token::Flag { dashes, name, value } => {
                self.dispatch(session, dashes, &name, value)?;
                Ok(true)
            }
        }
    }

    fn dispatch(
        &mut self,
        session: &mut Session,
        dashes: usize,
        name: &str,
        value: Option<String>,
    ) -> Result<()> {
        match self.registry.lookup(name) {
            Lookup::Found { flag, via_pattern } => {
                trace!(name, flag = %flag.name, via_pattern, "matched");
                self.apply(session, &flag, name, value, via_pattern)
            }
            Lookup::Sentinel(sentinel) => Err(self.announce(sentinel)),
            Lookup::Missing if dashes == 1 && self.posix_short => {
                self.apply_cluster(session, name, value)
            }
            Lookup::Missing => Err(Error::Unknown(name.to_string())),
        }
    }

    fn apply(
        &mut self,
        session: &mut Session,
        flag: &Rc<Flag>,
        name: &str,
        inline: Option<String>,
        via_pattern: bool,
    ) -> Result<()> {
        if flag.flags.contains(Flags::NOT_VALUE) {
            if let Some(fixed) = &flag.fixed {
                fixed();
            }
        } else if flag.slot.is_bool_flag() {
            set_bool(flag, name, inline.as_deref())?;
        } else if via_pattern && flag.flags.contains(Flags::REGEX_KEY_IS_VALUE) {
            set_value(flag, name, name)?;
        } else if flag.flags.contains(Flags::GREEDY_MODE) {
            consume_greedy(session, flag, name, inline)?;
        } else {
            let value = match inline {
                Some(v) => v,
                None => session
                    .take()
                    .ok_or_else(|| Error::MissingValue(name.to_string()))?,
            };
            set_value(flag, name, &value)?;
        }
        self.mark_seen(flag);
        Ok(())
    }

    /// Resolve `-abc` one character at a time. Characters that name no
    /// POSIX flag are skipped; a value-taking flag ends the walk.
    fn apply_cluster(
        &mut self,
        session: &mut Session,
        cluster: &str,
        inline: Option<String>,
    ) -> Result<()> {
        let mut matched = 0;
        let mut sentinel = None;

        for (i, c) in cluster.char_indices() {
            let end = i + c.len_utf8();
            let key = &cluster[i..end];
            let rest = &cluster[end..];
            let last = rest.is_empty();

            let (flag, via_pattern) = match self.registry.lookup(key) {
                Lookup::Found { flag, via_pattern } => (flag, via_pattern),
                Lookup::Sentinel(s) => {
                    sentinel.get_or_insert(s);
                    continue;
                }
                Lookup::Missing => continue,
            };
            if !flag.flags.contains(Flags::POSIX_SHORT) {
                continue;
            }
            matched += 1;
            trace!(cluster, key, flag = %flag.name, "cluster member");

            if flag.flags.contains(Flags::NOT_VALUE) {
                if let Some(fixed) = &flag.fixed {
                    fixed();
                }
                self.mark_seen(&flag);
                continue;
            }
            if flag.slot.is_bool_flag() {
                let value = if last { inline.as_deref() } else { None };
                set_bool(&flag, key, value)?;
                self.mark_seen(&flag);
                continue;
            }

            let value = if via_pattern && flag.flags.contains(Flags::REGEX_KEY_IS_VALUE) {
                cluster[i..].to_string()
            } else if !last {
                rest.to_string()
            } else if let Some(v) = inline.clone() {
                v
            } else {
                session
                    .take()
                    .ok_or_else(|| Error::MissingValue(key.to_string()))?
            };
            set_value(&flag, key, &value)?;
            self.mark_seen(&flag);
            break;
        }

        if matched > 0 {
            return Ok(());
        }
        match sentinel {
            Some(s) => Err(self.announce(s)),
            None => Err(Error::Unknown(cluster.to_string())),
        }
    }

    /// Print the usage or version text for a reserved flag.
    fn announce(&self, sentinel: Sentinel) -> Error {
        match sentinel {
            Sentinel::Help => {
                self.usage();
                Error::HelpRequested
            }
            Sentinel::Version => {
                self.print_version();
                Error::VersionRequested
            }
        }
    }

    /// Report a rejected command line: the message, then the usage text.
    pub(crate) fn fail(&self, err: &Error) {
        {
            let mut out = self.output();
            let _ = writeln!(out, "{}", err);
        }
        self.usage();
    }
}

fn set_bool(flag: &Flag, name: &str, value: Option<&str>) -> Result<()> {
    let value = value.unwrap_or("true");
    flag.slot.set(value).map_err(|reason| Error::InvalidBoolean {
        name: name.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn set_value(flag: &Flag, name: &str, value: &str) -> Result<()> {
    flag.slot.set(value).map_err(|reason| Error::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Feed the inline value and every following non-flag token to `flag`.
fn consume_greedy(
    session: &mut Session,
    flag: &Flag,
    name: &str,
    inline: Option<String>,
) -> Result<()> {
    let mut values: Vec<String> = inline.into_iter().collect();
    while session.peek().is_some_and(is_positional) {
        if let Some(v) = session.take() {
            values.push(v);
        }
    }
    if values.is_empty() {
        return Err(Error::MissingValue(name.to_string()));
    }
    for value in &values {
        set_value(flag, name, value)?;
    }
    Ok(())
}
