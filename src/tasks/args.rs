//! Positional and keyword arguments carried by a task.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Arguments passed to a [`Job`](crate::Job) call.
///
/// Values are [`serde_json::Value`]s, so anything JSON-representable can be
/// passed; richer shared state belongs in the job's closure.
///
/// ```
/// use taskfactory::Args;
///
/// let args = Args::new().arg(1).arg("two").kwarg("retries", 3);
/// assert_eq!(args.get(1).and_then(|v| v.as_str()), Some("two"));
/// assert_eq!(args.kw("retries").and_then(|v| v.as_u64()), Some(3));
/// assert_eq!(args.to_string(), r#"1, "two", retries=3"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl Args {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from a positional list.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keyword: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing a previous value with the same name.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Positional argument at `idx`.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.positional.get(idx)
    }

    /// Keyword argument by name.
    pub fn kw(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    pub fn args(&self) -> &[Value] {
        &self.positional
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// Total number of arguments (positional + keyword).
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Args {
    /// Renders as a call argument list: `1, "a", key=true`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.positional {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{v}")?;
        }
        for (k, v) in &self.keyword {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl<T: Into<Value>> FromIterator<T> for Args {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::positional(iter.into_iter().map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_positional_then_sorted_keywords() {
        let args = Args::new()
            .arg(json!([1, 2]))
            .kwarg("zeta", false)
            .kwarg("alpha", "x");
        assert_eq!(args.to_string(), r#"[1,2], alpha="x", zeta=false"#);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn empty_renders_nothing() {
        let args = Args::new();
        assert!(args.is_empty());
        assert_eq!(args.to_string(), "");
    }

    #[test]
    fn kwarg_overwrites() {
        let args = Args::new().kwarg("n", 1).kwarg("n", 2);
        assert_eq!(args.kw("n"), Some(&json!(2)));
        assert_eq!(args.kwargs().len(), 1);
    }

    #[test]
    fn collects_from_iterator() {
        let args: Args = (1..=3).collect();
        assert_eq!(args.args(), &[json!(1), json!(2), json!(3)]);
    }
}
