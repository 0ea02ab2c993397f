//! `re.*`: regular expressions over strings and bytes.
//!
//! Every function has a `(string, string)` and a `(bytes, bytes)` form. For
//! strings, reported offsets count code points; for bytes, they count bytes.
//! Matching is POSIX leftmost-longest: each match starts as early as possible
//! and, from that start, runs as far as possible.
//!
//! Each call compiles its pattern into a [`Regexer`] that lives only for the
//! duration of the call and is released on every exit path.

use pfa_core::{AvroType, Value};
use pfa_ir::{CallContext, FcnError, LibFcn, LibraryBuilder, RegistryError};
use regex_automata::meta::{self, Regex};
use regex_automata::{Anchored, Input, MatchKind, Span};
use regex_automata::util::syntax;

use crate::util::{FcnResult, bytes, concrete};

pub(crate) fn register(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    use AvroType::{Boolean, Int};

    let pairs = || AvroType::array(AvroType::array(Int));

    lib.register(search("re.index", index, |_| AvroType::array(Int))
        .doc("Offsets [begin, end) of the first match, or an empty array."))?
    .register(search("re.contains", contains, |_| Boolean))?
    .register(search("re.count", count, |_| Int)
        .doc("Number of non-overlapping matches."))?
    .register(search("re.rIndex", rindex, |_| AvroType::array(Int))
        .doc("Offsets [begin, end) of the last match, or an empty array."))?
    .register(search("re.groups", groups, |_| pairs())
        .doc("Offsets of the first match and each participating capture group."))?
    .register(search("re.indexAll", index_all, |_| pairs()))?
    .register(search("re.findAll", find_all, AvroType::array))?
    .register(search("re.findFirst", find_first, |t| AvroType::union([t, AvroType::Null]))
        .doc("Text of the first match, or null."))?
    .register(search("re.findGroupsFirst", find_groups_first, AvroType::array))?
    .register(search("re.findGroupsAll", find_groups_all, |t| {
        AvroType::array(AvroType::array(t))
    }))?
    .register(search("re.groupsAll", groups_all, |_| AvroType::array(pairs())))?
    .register(replace("re.replaceFirst", replace_first))?
    .register(replace("re.replaceLast", replace_last))?
    .register(replace("re.replaceAll", replace_all)
        .doc("Replace every match; the replacement is inserted literally."))?
    .register(search("re.split", split, AvroType::array)
        .doc("Pieces between matches, including empty ones."))?;
    Ok(())
}

/// `(haystack, pattern)` in both string and bytes forms.
fn search(name: &str, imp: pfa_ir::FcnImpl, ret: impl Fn(AvroType) -> AvroType) -> LibFcn {
    [AvroType::String, AvroType::Bytes]
        .into_iter()
        .fold(LibFcn::new(name, imp), |fcn, t| {
            fcn.signature(concrete(
                [("haystack", t.clone()), ("pattern", t.clone())],
                ret(t),
            ))
        })
}

/// `(haystack, pattern, replacement)` in both string and bytes forms.
fn replace(name: &str, imp: pfa_ir::FcnImpl) -> LibFcn {
    [AvroType::String, AvroType::Bytes]
        .into_iter()
        .fold(LibFcn::new(name, imp), |fcn, t| {
            fcn.signature(concrete(
                [
                    ("haystack", t.clone()),
                    ("pattern", t.clone()),
                    ("replacement", t.clone()),
                ],
                t,
            ))
        })
}

/// A compiled pattern scoped to one call.
///
/// `start` finds where the next match begins; `longest` is run anchored at
/// that position to extend the match as far as it goes.
struct Regexer {
    start: Regex,
    longest: Regex,
    text: bool,
}

impl Regexer {
    fn new(pattern: &[u8], text: bool) -> Result<Self, FcnError> {
        let pattern = std::str::from_utf8(pattern)
            .map_err(|_| FcnError::new("bad pattern: not valid UTF-8"))?;
        let build = |kind| {
            meta::Builder::new()
                .configure(meta::Config::new().match_kind(kind).utf8_empty(text))
                .syntax(syntax::Config::new().unicode(text).utf8(text))
                .build(pattern)
                .map_err(|e| FcnError::new(format!("bad pattern: {e}")))
        };
        let start = build(MatchKind::LeftmostFirst)?;
        let longest = build(MatchKind::All)?;
        tracing::trace!(pattern, "regex handle acquired");
        Ok(Self {
            start,
            longest,
            text,
        })
    }

    fn is_match(&self, haystack: &Haystack<'_>) -> bool {
        self.start.is_match(haystack.bytes)
    }

    /// The longest match beginning at the leftmost possible position at or
    /// after `at`: the whole match, then every capture group that participated.
    fn match_from(&self, bytes: &[u8], at: usize) -> Option<Vec<Span>> {
        let begin = self.start.search(&Input::new(bytes).range(at..))?.start();
        let mut caps = self.longest.create_captures();
        self.longest.search_captures(
            &Input::new(bytes).range(begin..).anchored(Anchored::Yes),
            &mut caps,
        );
        caps.get_match()?;
        Some(
            (0..caps.group_len())
                .filter_map(|i| caps.get_group(i))
                .collect(),
        )
    }

    /// Non-overlapping matches, left to right. An empty match directly after
    /// the previous match is skipped.
    fn captures<'h>(&'h self, bytes: &'h [u8]) -> impl Iterator<Item = Vec<Span>> + 'h {
        let mut at = 0;
        let mut last_end = None;
        std::iter::from_fn(move || {
            while at <= bytes.len() {
                let groups = self.match_from(bytes, at)?;
                let span = groups[0];
                if span.is_empty() {
                    at = span.end + self.step(bytes, span.end);
                    if last_end == Some(span.end) {
                        continue;
                    }
                } else {
                    at = span.end;
                }
                last_end = Some(span.end);
                return Some(groups);
            }
            None
        })
    }

    /// Width of the unit after `at`: one code point for text, one byte otherwise.
    fn step(&self, bytes: &[u8], at: usize) -> usize {
        match bytes.get(at) {
            Some(&b) if self.text && b >= 0xF0 => 4,
            Some(&b) if self.text && b >= 0xE0 => 3,
            Some(&b) if self.text && b >= 0xC0 => 2,
            _ => 1,
        }
    }

    fn first(&self, haystack: &Haystack<'_>) -> Option<Span> {
        self.captures(haystack.bytes).next().map(|groups| groups[0])
    }

    fn spans(&self, haystack: &Haystack<'_>) -> Vec<Span> {
        self.captures(haystack.bytes).map(|groups| groups[0]).collect()
    }
}

impl Drop for Regexer {
    fn drop(&mut self) {
        tracing::trace!("regex handle released");
    }
}

struct Haystack<'a> {
    bytes: &'a [u8],
    /// Byte offset of each code point followed by the total length. `None`
    /// for byte haystacks.
    starts: Option<Vec<usize>>,
}

impl<'a> Haystack<'a> {
    fn new(value: &'a Value) -> Result<Self, FcnError> {
        match value {
            Value::String(s) => {
                let mut starts: Vec<usize> = s.char_indices().map(|(i, _)| i).collect();
                starts.push(s.len());
                Ok(Self {
                    bytes: s.as_bytes(),
                    starts: Some(starts),
                })
            }
            _ => Ok(Self {
                bytes: bytes(std::slice::from_ref(value), 0)?,
                starts: None,
            }),
        }
    }

    fn offset(&self, byte: usize) -> i32 {
        let index = match &self.starts {
            Some(starts) => starts.binary_search(&byte).unwrap_or_else(|i| i),
            None => byte,
        };
        index as i32
    }

    fn pair(&self, span: Span) -> Value {
        Value::Array(vec![
            Value::Int(self.offset(span.start)),
            Value::Int(self.offset(span.end)),
        ])
    }

    fn slice(&self, span: Span) -> Value {
        self.wrap(self.bytes[span.range()].to_vec())
    }

    fn wrap(&self, raw: Vec<u8>) -> Value {
        match self.starts {
            Some(_) => Value::String(String::from_utf8_lossy(&raw).into_owned()),
            None => Value::Bytes(raw),
        }
    }

    /// Copy of the haystack with each span swapped for `replacement`.
    fn splice(&self, spans: &[Span], replacement: &[u8]) -> Value {
        let mut out = Vec::with_capacity(self.bytes.len());
        let mut at = 0;
        for span in spans {
            out.extend_from_slice(&self.bytes[at..span.start]);
            out.extend_from_slice(replacement);
            at = span.end;
        }
        out.extend_from_slice(&self.bytes[at..]);
        self.wrap(out)
    }
}

fn raw(args: &[Value], index: usize) -> Result<&[u8], FcnError> {
    match &args[index] {
        Value::String(s) => Ok(s.as_bytes()),
        _ => bytes(args, index),
    }
}

fn prepare(args: &[Value]) -> Result<(Haystack<'_>, Regexer), FcnError> {
    let haystack = Haystack::new(&args[0])?;
    let regexer = Regexer::new(raw(args, 1)?, haystack.starts.is_some())?;
    Ok((haystack, regexer))
}

fn index(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(re.first(&h).map_or_else(|| Value::Array(Vec::new()), |span| h.pair(span)))
}

fn contains(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(Value::Boolean(re.is_match(&h)))
}

fn count(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(Value::Int(re.captures(h.bytes).count() as i32))
}

fn rindex(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let last = re.spans(&h).pop();
    Ok(last.map_or_else(|| Value::Array(Vec::new()), |span| h.pair(span)))
}

fn groups(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let first = re.captures(h.bytes).next().unwrap_or_default();
    Ok(Value::Array(first.into_iter().map(|span| h.pair(span)).collect()))
}

fn index_all(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(Value::Array(re.spans(&h).into_iter().map(|span| h.pair(span)).collect()))
}

fn find_all(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(Value::Array(re.spans(&h).into_iter().map(|span| h.slice(span)).collect()))
}

fn find_first(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(re.first(&h).map_or(Value::Null, |span| h.slice(span)))
}

fn find_groups_first(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let first = re.captures(h.bytes).next().unwrap_or_default();
    Ok(Value::Array(first.into_iter().map(|span| h.slice(span)).collect()))
}

fn find_groups_all(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let all = re
        .captures(h.bytes)
        .map(|spans| Value::Array(spans.into_iter().map(|span| h.slice(span)).collect()))
        .collect();
    Ok(Value::Array(all))
}

fn groups_all(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let all = re
        .captures(h.bytes)
        .map(|spans| Value::Array(spans.into_iter().map(|span| h.pair(span)).collect()))
        .collect();
    Ok(Value::Array(all))
}

fn replace_first(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let spans: Vec<Span> = re.first(&h).into_iter().collect();
    Ok(h.splice(&spans, raw(args, 2)?))
}

fn replace_last(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let spans: Vec<Span> = re.spans(&h).pop().into_iter().collect();
    Ok(h.splice(&spans, raw(args, 2)?))
}

fn replace_all(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    Ok(h.splice(&re.spans(&h), raw(args, 2)?))
}

fn split(_: &mut CallContext<'_>, args: &[Value]) -> FcnResult {
    let (h, re) = prepare(args)?;
    let mut pieces = Vec::new();
    let mut at = 0;
    for span in re.spans(&h) {
        pieces.push(h.slice(Span { start: at, end: span.start }));
        at = span.end;
    }
    pieces.push(h.slice(Span { start: at, end: h.bytes.len() }));
    Ok(Value::Array(pieces))
}

#[cfg(test)]
#[path = "regex_tests.rs"]
mod regex_tests;
