//! Name tables for a flag set.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::flag::Flag;

/// Names that may be redefined without a conflict.
const RESERVED: [&str; 4] = ["h", "help", "V", "version"];

pub(crate) fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Split `"help, h"` into its trimmed aliases, shortest first, and the
/// display name built from them (`"h, help"`).
pub(crate) fn split_name(name: &str) -> (String, Vec<String>) {
    let mut aliases: Vec<String> = name
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    aliases.sort_by_key(|s| s.chars().count());
    (aliases.join(", "), aliases)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sentinel {
    Help,
    Version,
}

pub(crate) enum Lookup {
    Found { flag: Rc<Flag>, via_pattern: bool },
    Sentinel(Sentinel),
    Missing,
}

#[derive(Default)]
pub(crate) struct Registry {
    /// Display name → flag, sorted for listing.
    formal: BTreeMap<String, Rc<Flag>>,
    /// Every alias → flag.
    aliases: HashMap<String, Rc<Flag>>,
    /// Pattern flags in registration order.
    patterns: Vec<Rc<Flag>>,
}

impl Registry {
    /// Insert `flag` under its display name and every alias. On a conflict
    /// with a non-reserved name, nothing is changed and the conflicting
    /// name is returned. A flag displaced through a reserved name is
    /// removed entirely.
    pub(crate) fn insert(&mut self, flag: Flag) -> Result<Rc<Flag>, String> {
        let mut displaced: Vec<Rc<Flag>> = Vec::new();
        for alias in &flag.aliases {
            if let Some(existing) = self.aliases.get(alias) {
                if !is_reserved(alias) {
                    return Err(alias.clone());
                }
                if !displaced.iter().any(|d| Rc::ptr_eq(d, existing)) {
                    displaced.push(existing.clone());
                }
            }
        }
        if self.formal.contains_key(&flag.name)
            && !displaced.iter().any(|d| d.name == flag.name)
        {
            return Err(flag.name.clone());
        }

        for old in displaced {
            self.remove(&old);
        }

        let flag = Rc::new(flag);
        self.formal.insert(flag.name.clone(), flag.clone());
        for alias in &flag.aliases {
            self.aliases.insert(alias.clone(), flag.clone());
        }
        if flag.pattern.is_some() {
            self.patterns.push(flag.clone());
        }
        Ok(flag)
    }

    fn remove(&mut self, flag: &Rc<Flag>) {
        self.formal.remove(&flag.name);
        for alias in &flag.aliases {
            if self.aliases.get(alias).is_some_and(|f| Rc::ptr_eq(f, flag)) {
                self.aliases.remove(alias);
            }
        }
        self.patterns.retain(|f| !Rc::ptr_eq(f, flag));
    }

    /// Resolve a name taken from the command line.
    pub(crate) fn lookup(&self, name: &str) -> Lookup {
        if is_reserved(name) {
            return match self.aliases.get(name) {
                Some(flag) if !flag.builtin => Lookup::Found {
                    flag: flag.clone(),
                    via_pattern: false,
                },
                _ if name == "h" || name == "help" => Lookup::Sentinel(Sentinel::Help),
                _ => Lookup::Sentinel(Sentinel::Version),
            };
        }
        if let Some(flag) = self.aliases.get(name) {
            return Lookup::Found {
                flag: flag.clone(),
                via_pattern: false,
            };
        }
        let matched = self
            .patterns
            .iter()
            .find(|f| f.pattern.as_ref().is_some_and(|re| re.is_match(name)));
        match matched {
            Some(flag) => Lookup::Found {
                flag: flag.clone(),
                via_pattern: true,
            },
            None => Lookup::Missing,
        }
    }

    /// Find a flag by display name or alias, ignoring patterns.
    pub(crate) fn get(&self, name: &str) -> Option<&Rc<Flag>> {
        self.formal.get(name).or_else(|| self.aliases.get(name))
    }

    /// Flags in display-name order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Rc<Flag>> {
        self.formal.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.formal.len()
    }
}
