#![forbid(unsafe_code)]

//! Keyframe property maps.
//!
//! A [`Keyframes`] names the properties one animation call drives and the
//! values they end at. Property order is irrelevant; equality is map
//! equality, which is what dependency comparison in the runtime relies on.

use ahash::AHashMap;

use crate::value::Value;

/// Target values for one animation call, keyed by property name.
///
/// ```
/// use choreo_core::Keyframes;
///
/// let kf = Keyframes::new().set("r", 6.0).set("fill", "cornflowerblue");
/// assert_eq!(kf.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Keyframes {
    props: AHashMap<String, Value>,
}

impl Keyframes {
    /// Empty keyframe set. An empty set is legal: the call becomes a pure
    /// delay for its duration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property (builder pattern).
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_existing_property() {
        let kf = Keyframes::new().set("r", 0.0).set("r", 6.0);
        assert_eq!(kf.len(), 1);
        assert_eq!(kf.get("r"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = Keyframes::new().set("r", 6.0).set("opacity", 1.0);
        let b = Keyframes::new().set("opacity", 1.0).set("r", 6.0);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_keyframes_are_legal() {
        let kf = Keyframes::new();
        assert!(kf.is_empty());
        assert_eq!(kf.get("r"), None);
    }
}
