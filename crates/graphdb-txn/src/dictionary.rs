//! String ⇄ 32-bit dictionary code interner (spec.md §2, §6).
//!
//! spec.md treats the real dictionary-compression scheme as an external,
//! out-of-scope collaborator; this is the minimal in-memory interner the
//! `GraphStore::get_code`/`get_string` interface needs to function.

use graphdb_core::DictCode;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Dictionary {
    forward: RwLock<HashMap<String, DictCode>>,
    reverse: RwLock<Vec<Box<str>>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `s`, returning its existing code if already known.
    pub fn get_code(&self, s: &str) -> DictCode {
        if let Some(code) = self.forward.read().get(s) {
            return *code;
        }
        let mut forward = self.forward.write();
        // Re-check under the write lock: another thread may have interned
        // `s` between the read lock drop and this write lock acquire.
        if let Some(code) = forward.get(s) {
            return *code;
        }
        let mut reverse = self.reverse.write();
        let code = DictCode::new(reverse.len() as u32);
        reverse.push(s.into());
        forward.insert(s.to_string(), code);
        code
    }

    pub fn get_string(&self, code: DictCode) -> Option<String> {
        self.reverse
            .read()
            .get(code.raw() as usize)
            .map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let dict = Dictionary::new();
        let a = dict.get_code("Person");
        let b = dict.get_code("Person");
        let c = dict.get_code("Company");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(dict.get_string(a).as_deref(), Some("Person"));
    }

    #[test]
    fn unknown_code_returns_none() {
        let dict = Dictionary::new();
        assert_eq!(dict.get_string(DictCode::new(999)), None);
    }
}
