//! Value adapters.
//!
//! Every flag writes into a [`Slot`]: a closed set of typed variants, one per
//! supported type, plus [`Slot::Custom`] for caller-provided [`Value`]
//! implementations. The variant is chosen at registration through the sealed
//! [`FlagValue`] trait, so the engine never inspects types at runtime.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::num::IntErrorKind;
use std::rc::Rc;
use std::time::Duration;

// ============================================================================
// Var: shared handle to a bound variable
// ============================================================================

/// A variable bound to a flag.
///
/// Registration hands out (or takes) a `Var`; parsing writes through it and
/// the caller reads it back with [`Var::get`]. Clones share the same storage.
pub struct Var<T>(Rc<RefCell<T>>);

impl<T> Var<T> {
    pub fn new(value: T) -> Self {
        Var(Rc::new(RefCell::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl<T: Clone> Var<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Var(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for Var<T> {
    fn default() -> Self {
        Var::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Var").field(&*self.0.borrow()).finish()
    }
}

// ============================================================================
// Value: caller-implemented adapters
// ============================================================================

/// A custom value adapter.
///
/// `set` is called once per occurrence on the command line, in order.
/// Adapters that report `is_bool_flag` are set to `"true"` when the flag
/// appears without `=value`, and never consume the following token.
pub trait Value {
    fn set(&mut self, text: &str) -> Result<(), String>;

    fn render(&self) -> String;

    fn is_bool_flag(&self) -> bool {
        false
    }

    /// Placeholder shown after the flag name in usage output.
    fn type_name(&self) -> &str {
        "value"
    }
}

// ============================================================================
// Slot: the closed set of adapters
// ============================================================================

#[doc(hidden)]
#[derive(Clone)]
pub enum Slot {
    Bool(Var<bool>),
    Byte(Var<u8>),
    Int(Var<i32>),
    Int64(Var<i64>),
    Uint(Var<usize>),
    Uint64(Var<u64>),
    Str(Var<String>),
    Float64(Var<f64>),
    Duration(Var<Duration>),
    BoolSlice(Var<Vec<bool>>),
    StringSlice(Var<Vec<String>>),
    Int64Slice(Var<Vec<i64>>),
    DurationSlice(Var<Vec<Duration>>),
    Custom(Rc<RefCell<dyn Value>>),
}

impl Slot {
    /// Parse `text` into the bound variable. Scalars are replaced, slices
    /// get one element appended.
    pub(crate) fn set(&self, text: &str) -> Result<(), String> {
        match self {
            Slot::Bool(v) => v.set(parse_bool(text)?),
            Slot::Byte(v) => v.set(parse_unsigned(text, 10, 8)? as u8),
            Slot::Int(v) => v.set(parse_signed(text, 10, 32)? as i32),
            Slot::Int64(v) => v.set(parse_signed(text, 0, 64)?),
            Slot::Uint(v) => v.set(parse_unsigned(text, 0, usize::BITS)? as usize),
            Slot::Uint64(v) => v.set(parse_unsigned(text, 0, 64)?),
            Slot::Str(v) => v.set(text.to_string()),
            Slot::Float64(v) => v.set(parse_float(text)?),
            Slot::Duration(v) => v.set(parse_duration(text)?),
            Slot::BoolSlice(v) => {
                let b = parse_bool(text)?;
                v.with_mut(|items| items.push(b));
            }
            Slot::StringSlice(v) => v.with_mut(|items| items.push(text.to_string())),
            Slot::Int64Slice(v) => {
                let n = parse_signed(text, 0, 64)?;
                v.with_mut(|items| items.push(n));
            }
            Slot::DurationSlice(v) => {
                let d = parse_duration(text)?;
                v.with_mut(|items| items.push(d));
            }
            Slot::Custom(v) => v.borrow_mut().set(text)?,
        }
        Ok(())
    }

    pub(crate) fn render(&self) -> String {
        match self {
            Slot::Bool(v) => v.get().to_string(),
            Slot::Byte(v) => v.get().to_string(),
            Slot::Int(v) => v.get().to_string(),
            Slot::Int64(v) => v.get().to_string(),
            Slot::Uint(v) => v.get().to_string(),
            Slot::Uint64(v) => v.get().to_string(),
            Slot::Str(v) => v.get(),
            Slot::Float64(v) => format_float(v.get()),
            Slot::Duration(v) => format_duration(v.get()),
            Slot::BoolSlice(v) => json_or_empty(serde_json::to_string(&*v.borrow())),
            Slot::StringSlice(v) => json_or_empty(serde_json::to_string(&*v.borrow())),
            Slot::Int64Slice(v) => json_or_empty(serde_json::to_string(&*v.borrow())),
            Slot::DurationSlice(v) => {
                let items: Vec<String> = v.borrow().iter().map(|d| format_duration(*d)).collect();
                format!("[{}]", items.join(", "))
            }
            Slot::Custom(v) => v.borrow().render(),
        }
    }

    pub(crate) fn is_bool_flag(&self) -> bool {
        match self {
            Slot::Bool(_) | Slot::BoolSlice(_) => true,
            Slot::Custom(v) => v.borrow().is_bool_flag(),
            _ => false,
        }
    }

    pub(crate) fn type_name(&self) -> String {
        let name = match self {
            Slot::Bool(_) => "",
            Slot::Duration(_) => "duration",
            Slot::DurationSlice(_) => "duration[]",
            Slot::Float64(_) => "float",
            Slot::Int(_) | Slot::Int64(_) => "int",
            Slot::Str(_) => "string",
            Slot::StringSlice(_) => "string[]",
            Slot::Uint(_) | Slot::Uint64(_) => "uint",
            Slot::Custom(v) => {
                let v = v.borrow();
                return if v.is_bool_flag() {
                    String::new()
                } else {
                    v.type_name().to_string()
                };
            }
            Slot::Byte(_) | Slot::BoolSlice(_) | Slot::Int64Slice(_) => "value",
        };
        name.to_string()
    }

    /// Rendering of the type's zero value, if the type has one.
    pub(crate) fn zero_text(&self) -> Option<String> {
        let zero = match self {
            Slot::Bool(_) => "false".to_string(),
            Slot::Byte(_)
            | Slot::Int(_)
            | Slot::Int64(_)
            | Slot::Uint(_)
            | Slot::Uint64(_)
            | Slot::Float64(_) => "0".to_string(),
            Slot::Str(_) => String::new(),
            Slot::Duration(_) => "0s".to_string(),
            Slot::BoolSlice(_)
            | Slot::StringSlice(_)
            | Slot::Int64Slice(_)
            | Slot::DurationSlice(_) => "[]".to_string(),
            Slot::Custom(_) => return None,
        };
        Some(zero)
    }

    pub(crate) fn is_string(&self) -> bool {
        matches!(self, Slot::Str(_))
    }
}

fn json_or_empty(rendered: serde_json::Result<String>) -> String {
    rendered.unwrap_or_else(|_| "[]".to_string())
}

// ============================================================================
// FlagValue: the supported variable types
// ============================================================================

mod sealed {
    pub trait Sealed {}
}

/// Types a flag can be bound to.
///
/// Sealed: the set of adapters is closed. Use [`Value`] for anything else.
pub trait FlagValue: Clone + 'static + sealed::Sealed {
    #[doc(hidden)]
    fn into_slot(var: Var<Self>) -> Slot;

    /// Convert default-value text from a binding tag. Slice types split the
    /// text on `sep` first.
    fn parse_default(text: &str, sep: &str) -> Result<Self, String>;
}

macro_rules! scalar_value {
    ($($ty:ty => $variant:ident, $parse:expr;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl FlagValue for $ty {
                fn into_slot(var: Var<Self>) -> Slot {
                    Slot::$variant(var)
                }

                fn parse_default(text: &str, _sep: &str) -> Result<Self, String> {
                    ($parse)(text)
                }
            }
        )*
    };
}

scalar_value! {
    bool => Bool, parse_bool;
    u8 => Byte, parse_byte;
    i32 => Int, |t: &str| parse_signed(t, 10, 32).map(|n| n as i32);
    i64 => Int64, |t: &str| parse_signed(t, 10, 64);
    usize => Uint, |t: &str| parse_unsigned(t, 10, usize::BITS).map(|n| n as usize);
    u64 => Uint64, |t: &str| parse_unsigned(t, 10, 64);
    String => Str, |t: &str| Ok::<_, String>(t.to_string());
    f64 => Float64, parse_float;
    Duration => Duration, parse_duration;
}

macro_rules! slice_value {
    ($($elem:ty => $variant:ident, $parse:expr;)*) => {
        $(
            impl sealed::Sealed for Vec<$elem> {}

            impl FlagValue for Vec<$elem> {
                fn into_slot(var: Var<Self>) -> Slot {
                    Slot::$variant(var)
                }

                fn parse_default(text: &str, sep: &str) -> Result<Self, String> {
                    text.split(sep).map($parse).collect()
                }
            }
        )*
    };
}

slice_value! {
    bool => BoolSlice, parse_bool;
    String => StringSlice, |t: &str| Ok::<_, String>(t.to_string());
    i64 => Int64Slice, |t: &str| parse_signed(t, 10, 64);
    Duration => DurationSlice, parse_duration;
}

// ============================================================================
// Scalar parsers
// ============================================================================

fn invalid_syntax(text: &str) -> String {
    format!("parsing {:?}: invalid syntax", text)
}

fn out_of_range(text: &str) -> String {
    format!("parsing {:?}: value out of range", text)
}

pub(crate) fn parse_bool(text: &str) -> Result<bool, String> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(invalid_syntax(text)),
    }
}

/// Parse the unsigned magnitude in `digits`. Base 0 picks the radix from the
/// prefix: `0x`, `0o`, `0b`, or a bare leading `0` for octal.
fn parse_magnitude(text: &str, digits: &str, base: u32) -> Result<u64, String> {
    let (radix, body) = if base == 0 {
        let prefix = digits.get(..2).map(|p| p.to_ascii_lowercase());
        match prefix.as_deref() {
            Some("0x") => (16, &digits[2..]),
            Some("0o") => (8, &digits[2..]),
            Some("0b") => (2, &digits[2..]),
            _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
            _ => (10, digits),
        }
    } else {
        (base, digits)
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(invalid_syntax(text));
    }
    u64::from_str_radix(body, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => out_of_range(text),
        _ => invalid_syntax(text),
    })
}

pub(crate) fn parse_signed(text: &str, base: u32, bits: u32) -> Result<i64, String> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'+') => (false, &text[1..]),
        Some(b'-') => (true, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_magnitude(text, digits, base)?;
    let limit = 1u64 << (bits - 1);
    if (!negative && magnitude >= limit) || (negative && magnitude > limit) {
        return Err(out_of_range(text));
    }
    let n = magnitude as i64;
    Ok(if negative { n.wrapping_neg() } else { n })
}

pub(crate) fn parse_unsigned(text: &str, base: u32, bits: u32) -> Result<u64, String> {
    if text.starts_with(['+', '-']) {
        return Err(invalid_syntax(text));
    }
    let n = parse_magnitude(text, text, base)?;
    if bits < 64 && n >> bits != 0 {
        return Err(out_of_range(text));
    }
    Ok(n)
}

pub(crate) fn parse_float(text: &str) -> Result<f64, String> {
    text.parse::<f64>().map_err(|_| invalid_syntax(text))
}

/// Shortest round-trip text, switching to exponent form below `1e-4` and
/// from `1e+06` up: `2.718e+31`, `1e-05`, `100000`.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let sci = format!("{:e}", v);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return v.to_string();
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if v != 0.0 && !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
    } else {
        v.to_string()
    }
}

/// Byte default text: a C escape (`\n`, `\e`, ...), `xHH` hex, `0OOO` octal,
/// or decimal.
pub(crate) fn parse_byte(text: &str) -> Result<u8, String> {
    let b = match text {
        r"\a" => 0x07,
        r"\b" => 0x08,
        r"\e" => 0x1b,
        r"\f" => 0x0c,
        r"\n" => b'\n',
        r"\r" => b'\r',
        r"\t" => b'\t',
        r"\v" => 0x0b,
        _ => {
            let n = if let Some(hex) = text.strip_prefix('x') {
                parse_unsigned(hex, 16, 8)
            } else if text.len() > 1 && text.starts_with('0') {
                parse_unsigned(&text[1..], 8, 8)
            } else {
                parse_unsigned(text, 10, 8)
            };
            n.map_err(|_| invalid_syntax(text))? as u8
        }
    };
    Ok(b)
}

// ============================================================================
// Durations
// ============================================================================

const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;

fn unit_nanos(unit: &str) -> Option<u128> {
    let n = match unit {
        "ns" => 1,
        "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => NANOS_PER_MIN,
        "h" => 60 * NANOS_PER_MIN,
        _ => return None,
    };
    Some(n)
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`: a sequence of
/// decimal numbers, each with an optional fraction and a unit suffix.
pub(crate) fn parse_duration(text: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration {:?}", text);

    let (negative, mut s) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_digits, rest) = s.split_at(int_end);
        s = rest;

        let mut frac_digits = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            frac_digits = &rest[..frac_end];
            s = &rest[frac_end..];
        } else if int_digits.is_empty() {
            return Err(invalid());
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let unit_end = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        if unit_end == 0 {
            return Err(format!("missing unit in duration {:?}", text));
        }
        let (unit, rest) = s.split_at(unit_end);
        s = rest;
        let scale = unit_nanos(unit)
            .ok_or_else(|| format!("unknown unit {:?} in duration {:?}", unit, text))?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| invalid())?
        };
        total = whole
            .checked_mul(scale)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(invalid)?;

        // Anything past 18 fractional digits is below nanosecond precision.
        let frac_digits = &frac_digits[..frac_digits.len().min(18)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| invalid())?;
            let denominator = 10u128.pow(frac_digits.len() as u32);
            total = total
                .checked_add(numerator * scale / denominator)
                .ok_or_else(invalid)?;
        }
    }

    if total > u64::MAX as u128 {
        return Err(invalid());
    }
    if negative && total != 0 {
        return Err(format!("negative duration {:?}", text));
    }
    Ok(Duration::from_nanos(total as u64))
}

fn with_fraction(value: u128, precision: u32) -> String {
    let scale = 10u128.pow(precision);
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = precision as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Render a duration as `72h3m0.5s`, `1.5s`, `300ms` and so on. The output
/// is accepted by [`parse_duration`].
pub(crate) fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}\u{b5}s", with_fraction(nanos, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", with_fraction(nanos, 6));
    }

    let mut out = String::new();
    let minutes = nanos / NANOS_PER_MIN;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&with_fraction(nanos % NANOS_PER_MIN, 9));
    out.push('s');
    out
}
