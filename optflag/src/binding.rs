//! Declarative registration from tagged fields.
//!
//! A type implements [`BindFields`] by handing each of its [`Var`] fields to
//! a [`Binder`] together with a tag string in the usual `key:"value"` form:
//!
//! ```text
//! opt:"H, header" flags:"posix" usage:"http header"
//! ```
//!
//! Recognized keys are `opt` (the flag name, required), `usage` (required),
//! `defValue` (default, converted with the field type's parser), `flags`
//! (`posix` and `greedy`, joined with `|`) and `sep` (the separator for
//! slice defaults, `,` when absent). Fields without `opt` or `usage` are
//! skipped. A tag cannot carry a match value, so `notValue` panics.

use tracing::trace;

use crate::error::Result;
use crate::flag::Flags;
use crate::flagset::FlagSet;
use crate::value::{FlagValue, Var};

/// A `key:"value" key:"value"` tag string.
#[derive(Debug, Clone, Copy)]
pub struct StructTag<'a>(pub &'a str);

impl StructTag<'_> {
    /// Value for `key`, or `None` when the key is absent or the tag is
    /// malformed before it.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut tag = self.0;
        loop {
            tag = tag.trim_start_matches(' ');
            if tag.is_empty() {
                return None;
            }

            let name_len = tag
                .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\x7f')
                .unwrap_or(tag.len());
            if name_len == 0 || !tag[name_len..].starts_with(":\"") {
                return None;
            }
            let name = &tag[..name_len];
            tag = &tag[name_len + 1..];

            let bytes = tag.as_bytes();
            let mut i = 1;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            let quoted = &tag[1..i];
            tag = &tag[i + 1..];

            if name == key {
                return Some(unquote(quoted));
            }
        }
    }
}

fn unquote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse a `|`-separated `flags` tag. Unknown words are ignored.
pub fn parse_flags(text: &str) -> Flags {
    let mut flags = Flags::NONE;
    for word in text.split('|') {
        match word.trim() {
            "posix" | "Posix" => flags |= Flags::POSIX_SHORT,
            "greedy" | "Greedy" => flags |= Flags::GREEDY_MODE,
            "notValue" | "NotValue" => flags |= Flags::NOT_VALUE,
            _ => {}
        }
    }
    flags
}

/// A group of tagged fields that can be registered on a [`FlagSet`].
pub trait BindFields {
    fn bind_fields(&self, binder: &mut Binder<'_>);
}

/// Registers tagged fields on a flag set; see [`BindFields`].
pub struct Binder<'a> {
    set: &'a mut FlagSet,
}

impl<'a> Binder<'a> {
    pub fn new(set: &'a mut FlagSet) -> Self {
        Binder { set }
    }

    /// Register `var` as described by `tag`. A `defValue` that does not
    /// convert to the field's type panics.
    pub fn field<T: FlagValue>(&mut self, var: &Var<T>, tag: &str) -> &mut Self {
        let tag = StructTag(tag);
        let (Some(opt), Some(usage)) = (tag.get("opt"), tag.get("usage")) else {
            trace!(tag = tag.0, "field skipped");
            return self;
        };
        if opt.is_empty() || usage.is_empty() {
            return self;
        }
        let flags = parse_flags(&tag.get("flags").unwrap_or_default());
        if flags.contains(Flags::NOT_VALUE) {
            panic!("flag {}: notValue needs a match value, use Opt::match_var", opt);
        }

        match tag.get("defValue").filter(|d| !d.is_empty()) {
            Some(text) => {
                let sep = tag.get("sep").filter(|s| !s.is_empty());
                let sep = sep.as_deref().unwrap_or(",");
                let default = T::parse_default(&text, sep).unwrap_or_else(|reason| {
                    panic!("flag {}: invalid default {:?}: {}", opt, text, reason)
                });
                self.set.opt(&opt, &usage).flags(flags).default_var(var, default);
            }
            None => self.set.opt(&opt, &usage).flags(flags).var(var),
        }
        self
    }

    /// Register the fields of a nested group.
    pub fn group(&mut self, nested: &dyn BindFields) -> &mut Self {
        nested.bind_fields(self);
        self
    }
}

impl FlagSet {
    /// Register every tagged field of `fields`.
    pub fn bind_struct(&mut self, fields: &dyn BindFields) {
        fields.bind_fields(&mut Binder::new(self));
    }

    /// Register every tagged field of `fields`, then parse `arguments`.
    pub fn parse_struct<S: AsRef<str>>(
        &mut self,
        arguments: &[S],
        fields: &dyn BindFields,
    ) -> Result<()> {
        self.bind_struct(fields);
        self.parse(arguments)
    }
}
