//! Built-in function library.
//!
//! Functions are grouped by namespace:
//! - `ops`: arithmetic, comparison and logic operators (`+`, `<`, `&&`, ...)
//! - `math`: `m.*`
//! - `string`: `s.*`
//! - `bytes`: `bytes.*` and `fixed.*`
//! - `collections`: `a.*` and `map.*`
//! - `rand`: `rand.*`, the only functions that consume engine RNG state
//! - `regex`: `re.*`
//!
//! Hosts that want extra functions call [`register_all`] on their own
//! [`LibraryBuilder`] and register on top.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod bytes;
mod collections;
mod math;
mod ops;
mod rand;
mod regex;
mod string;
mod util;

#[cfg(test)]
mod test_utils;

use pfa_ir::{Library, LibraryBuilder, RegistryError};

/// Register every built-in function.
pub fn register_all(lib: &mut LibraryBuilder) -> Result<(), RegistryError> {
    ops::register(lib)?;
    math::register(lib)?;
    string::register(lib)?;
    bytes::register(lib)?;
    collections::register(lib)?;
    rand::register(lib)?;
    regex::register(lib)?;
    Ok(())
}

/// Library containing exactly the built-in functions.
pub fn default_library() -> Result<Library, RegistryError> {
    let mut lib = Library::builder();
    register_all(&mut lib)?;
    Ok(lib.build())
}

#[cfg(test)]
mod tests {
    use super::default_library;

    #[test]
    fn every_namespace_is_registered() {
        let lib = default_library().expect("built-ins register cleanly");

        for name in ["+", "m.sqrt", "s.len", "bytes.len", "fixed.toBytes", "a.len", "map.keys", "rand.int", "re.split"] {
            assert!(lib.is_known(name), "{name} missing");
        }
    }

    #[test]
    fn overloads_are_listed() {
        let lib = default_library().expect("built-ins register cleanly");

        let listed: Vec<String> = lib
            .list_signatures("re.findFirst")
            .expect("re.findFirst")
            .iter()
            .map(ToString::to_string)
            .collect();
        insta::assert_snapshot!(listed.join("\n"), @r"
        (haystack: string, pattern: string) -> union[string, null]
        (haystack: bytes, pattern: bytes) -> union[bytes, null]
        ");
    }
}
