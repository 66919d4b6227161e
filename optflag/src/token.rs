use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// `--`: everything after it is positional.
    Terminator,
    Positional,
    Flag {
        dashes: usize,
        name: String,
        value: Option<String>,
    },
}

/// A token that can never introduce a flag: too short, or no leading dash.
pub(crate) fn is_positional(arg: &str) -> bool {
    arg.len() < 2 || !arg.starts_with('-')
}

pub(crate) fn classify(arg: &str) -> Result<Token> {
    if arg == "--" {
        return Ok(Token::Terminator);
    }
    if is_positional(arg) {
        return Ok(Token::Positional);
    }

    let (dashes, rest) = match arg.strip_prefix("--") {
        Some(rest) => (2, rest),
        None => (1, &arg[1..]),
    };
    if rest.starts_with(['-', '=']) {
        return Err(Error::BadSyntax(arg.to_string()));
    }

    // An '=' in first position is rejected above, so search after it.
    let first = rest.chars().next().map_or(0, char::len_utf8);
    let (name, value) = match rest[first..].find('=') {
        Some(i) => (&rest[..first + i], Some(rest[first + i + 1..].to_string())),
        None => (rest, None),
    };
    Ok(Token::Flag {
        dashes,
        name: name.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(dashes: usize, name: &str, value: Option<&str>) -> Token {
        Token::Flag {
            dashes,
            name: name.to_string(),
            value: value.map(str::to_string),
        }
    }

    #[test]
    fn positional_and_terminator() {
        assert_eq!(classify("--"), Ok(Token::Terminator));
        assert_eq!(classify("-"), Ok(Token::Positional));
        assert_eq!(classify("file.txt"), Ok(Token::Positional));
        assert_eq!(classify(""), Ok(Token::Positional));
        assert!(is_positional("x"));
        assert!(!is_positional("-x"));
        assert!(!is_positional("--"));
    }

    #[test]
    fn flag_forms() {
        assert_eq!(classify("-v"), Ok(flag(1, "v", None)));
        assert_eq!(classify("--verbose"), Ok(flag(2, "verbose", None)));
        assert_eq!(classify("-n=5"), Ok(flag(1, "n", Some("5"))));
        assert_eq!(classify("--url=a=b"), Ok(flag(2, "url", Some("a=b"))));
        assert_eq!(classify("-s="), Ok(flag(1, "s", Some(""))));
        assert_eq!(classify("-tsnEebA"), Ok(flag(1, "tsnEebA", None)));
    }

    #[test]
    fn malformed() {
        assert_eq!(classify("---x"), Err(Error::BadSyntax("---x".into())));
        assert_eq!(classify("-=x"), Err(Error::BadSyntax("-=x".into())));
        assert_eq!(classify("--=x"), Err(Error::BadSyntax("--=x".into())));
    }
}
