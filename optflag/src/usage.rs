//! Usage, defaults and version text.

use std::io::Write;

use crate::flag::Flag;
use crate::flagset::FlagSet;

/// Extract a back-quoted placeholder name from the flag's usage text.
///
/// Given ``"search `DIR` for files"``, returns `("DIR", "search DIR for
/// files")`. Without back quotes the name is the flag's type name (empty
/// for booleans).
pub fn unquote_usage(flag: &Flag) -> (String, String) {
    let usage = flag.usage();
    if let Some(start) = usage.find('`') {
        if let Some(len) = usage[start + 1..].find('`') {
            let name = &usage[start + 1..start + 1 + len];
            let text = format!("{}{}{}", &usage[..start], name, &usage[start + len + 2..]);
            return (name.to_string(), text);
        }
    }
    (flag.type_name(), usage.to_string())
}

/// Whether `value` is the zero value of the flag's type, in which case the
/// default is left out of the listing.
pub(crate) fn is_zero_value(flag: &Flag, value: &str) -> bool {
    if flag.slot.zero_text().as_deref() == Some(value) {
        return true;
    }
    matches!(value, "false" | "" | "0")
}

fn format_flag(flag: &Flag) -> String {
    let mut line = format!("  -{}", flag.name().replace(", ", ", --"));
    let (name, usage) = unquote_usage(flag);
    if !name.is_empty() {
        line.push(' ');
        line.push_str(&name);
    }
    // Single-letter booleans keep their usage on the same line.
    if line.len() <= 4 {
        line.push('\t');
    } else {
        line.push_str("\n    \t");
    }
    line.push_str(&usage.replace('\n', "\n    \t"));

    let default = flag.def_value();
    if !is_zero_value(flag, default) {
        if flag.slot.is_string() {
            line.push_str(&format!(" (default {:?})", default));
        } else {
            line.push_str(&format!(" (default {})", default));
        }
    }
    line.push('\n');
    line
}

impl FlagSet {
    /// The listing printed by [`FlagSet::print_defaults`].
    pub fn defaults(&self) -> String {
        let mut text = String::new();
        self.visit_all(|flag| text.push_str(&format_flag(flag)));
        text
    }

    /// Write every defined flag with its usage and default to the output.
    pub fn print_defaults(&self) {
        let text = self.defaults();
        let _ = write!(self.output(), "{}", text);
    }

    /// Author line, `Usage of NAME:` header, then the defaults.
    pub fn default_usage(&self) {
        {
            let mut out = self.output();
            if !self.author_text().is_empty() {
                let _ = write!(out, "{}\n\n", self.author_text());
            }
            if self.name().is_empty() {
                let _ = writeln!(out, "Usage:");
            } else {
                let _ = writeln!(out, "Usage of {}:", self.name());
            }
        }
        self.print_defaults();
    }

    /// Run the custom usage printer if one is set, the default otherwise.
    pub fn usage(&self) {
        match self.usage_hook() {
            Some(hook) => hook(self),
            None => self.default_usage(),
        }
    }

    pub fn print_version(&self) {
        let mut out = self.output();
        if self.name().is_empty() {
            let _ = writeln!(out, "{}", self.version_text());
        } else {
            let _ = writeln!(out, "{} {}", self.name(), self.version_text());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::flag::Flags;
    use crate::flagset::ErrorHandling;
    use crate::test_util::SharedBuf;

    fn demo() -> (FlagSet, SharedBuf) {
        let buf = SharedBuf::default();
        let mut fs = FlagSet::new("demo", ErrorHandling::ContinueOnError);
        fs.set_output(buf.clone());
        let _ = fs.opt("v", "verbose").flags(Flags::POSIX).new_bool(false);
        let _ = fs.int("n, lines", 10, "number of lines");
        let _ = fs.string("name", "guest", "user `NAME` to log in as");
        let _ = fs.duration("wait", Duration::ZERO, "time to wait\nbetween retries");
        let _ = fs.string_slice("H", vec!["a: b".to_string()], "extra header");
        (fs, buf)
    }

    #[test]
    fn defaults_listing() {
        let (fs, _) = demo();
        let expected = "  -H string[]\n    \textra header (default [\"a: b\"])\n\
                        \x20 -V, --version\n    \toutput version information and exit\n\
                        \x20 -h, --help\n    \tdisplay this help and exit\n\
                        \x20 -n, --lines int\n    \tnumber of lines (default 10)\n\
                        \x20 -name NAME\n    \tuser NAME to log in as (default \"guest\")\n\
                        \x20 -v\tverbose\n\
                        \x20 -wait duration\n    \ttime to wait\n    \tbetween retries\n";
        assert_eq!(fs.defaults(), expected);
    }

    #[test]
    fn usage_header_and_author() {
        let (fs, buf) = demo();
        let fs = fs.author("Jane Doe <jane@example.com>");
        fs.usage();
        let text = buf.contents();
        assert!(text.starts_with("Jane Doe <jane@example.com>\n\nUsage of demo:\n  -H string[]"));

        let buf = SharedBuf::default();
        let mut anon = FlagSet::new("", ErrorHandling::ContinueOnError);
        anon.set_output(buf.clone());
        anon.usage();
        assert!(buf.contents().starts_with("Usage:\n  -V, --version"));
    }

    #[test]
    fn custom_usage_hook() {
        let (mut fs, buf) = demo();
        fs.set_usage(|fs| {
            let _ = writeln!(fs.output(), "usage: demo [flags] FILE");
        });
        let _ = fs.parse(&["-bogus"]);
        assert_eq!(
            buf.contents(),
            "flag provided but not defined: -bogus\nusage: demo [flags] FILE\n"
        );
    }

    #[test]
    fn version_line() {
        let buf = SharedBuf::default();
        let mut fs = FlagSet::new("tool", ErrorHandling::ContinueOnError).version("0.3.1");
        fs.set_output(buf.clone());
        fs.print_version();
        assert_eq!(buf.contents(), "tool 0.3.1\n");
    }

    #[test]
    fn placeholder_names() {
        let (fs, _) = demo();
        let flag = fs.lookup("name").unwrap();
        assert_eq!(
            unquote_usage(flag),
            ("NAME".to_string(), "user NAME to log in as".to_string())
        );
        let flag = fs.lookup("v").unwrap();
        assert_eq!(unquote_usage(flag), (String::new(), "verbose".to_string()));
        assert!(is_zero_value(flag, "false"));
        let flag = fs.lookup("wait").unwrap();
        assert!(is_zero_value(flag, "0s"));
        assert!(!is_zero_value(flag, "1s"));
    }
}
