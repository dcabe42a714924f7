use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const VISIBLE_SUFFIX: usize = 4;

/// Wraps a phone number or user identifier so that `tracing` output only shows
/// its last few characters. Serialization still emits the real value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn redacted(&self) -> String {
        let value = self.0.as_ref();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= VISIBLE_SUFFIX {
            return "*".repeat(chars.len());
        }
        let hidden = chars.len() - VISIBLE_SUFFIX;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
