use std::fmt;
use std::rc::Rc;

use super::syntax::Value;

#[derive(Clone, Default)]
pub struct Env {
    head: Option<Rc<Frame>>,
}

struct Frame {
    name: String,
    value: Value,
    parent: Env,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn push(&self, name: impl Into<String>, value: Value) -> Env {
        Env {
            head: Some(Rc::new(Frame {
                name: name.into(),
                value,
                parent: self.clone(),
            })),
        }
    }

    pub fn pop(&self) -> Option<Env> {
        self.head.as_ref().map(|frame| frame.parent.clone())
    }

    pub fn top(&self) -> Option<(&str, &Value)> {
        self.head
            .as_deref()
            .map(|frame| (frame.name.as_str(), &frame.value))
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
    }

    /// 1-based de Bruijn lookup.
    pub fn nth(&self, index: usize) -> Option<&Value> {
        let position = index.checked_sub(1)?;
        self.iter().nth(position).map(|(_, value)| value)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    fn bindings_oldest_first(&self) -> Vec<(&str, &Value)> {
        let mut bindings = self.iter().collect::<Vec<_>>();
        bindings.reverse();
        bindings
    }
}

pub struct Iter<'a> {
    next: Option<&'a Frame>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.parent.head.as_deref();
        Some((frame.name.as_str(), &frame.value))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Env {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Env::new(), |env, (name, value)| env.push(name, value))
    }
}

impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(left), Some(right)) if Rc::ptr_eq(left, right) => true,
            _ => self.iter().eq(other.iter()),
        }
    }
}

impl Eq for Env {}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.bindings_oldest_first()).finish()
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .bindings_oldest_first()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::Env;
    use crate::ml::syntax::Value;

    #[test]
    fn lookup_prefers_most_recent_binding() {
        let env = Env::new()
            .push("x", Value::Int(1))
            .push("y", Value::Int(2))
            .push("x", Value::Int(3));
        assert_eq!(env.lookup("x"), Some(&Value::Int(3)));
        assert_eq!(env.lookup("y"), Some(&Value::Int(2)));
        assert_eq!(env.lookup("z"), None);
    }

    #[test]
    fn push_leaves_the_original_untouched() {
        let base = Env::new().push("x", Value::Int(1));
        let extended = base.push("y", Value::Bool(true));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.pop(), Some(base.clone()));
        assert_eq!(base.pop(), Some(Env::new()));
        assert_eq!(Env::new().pop(), None);
    }

    #[test]
    fn nth_counts_from_most_recent_binding() {
        let env = Env::from_iter([("a", Value::Int(10)), ("b", Value::Int(20))]);
        assert_eq!(env.nth(1), Some(&Value::Int(20)));
        assert_eq!(env.nth(2), Some(&Value::Int(10)));
        assert_eq!(env.nth(0), None);
        assert_eq!(env.nth(3), None);
    }

    #[test]
    fn displays_bindings_oldest_first_without_spaces() {
        let env = Env::from_iter([
            ("x", Value::Int(3)),
            ("y", Value::Int(2)),
            ("z", Value::Bool(true)),
        ]);
        assert_eq!(env.to_string(), "x=3,y=2,z=true");
        assert_eq!(env.top(), Some(("z", &Value::Bool(true))));
    }

    #[test]
    fn equality_is_structural() {
        let left = Env::new().push("x", Value::Int(1));
        let right = Env::new().push("x", Value::Int(1));
        assert_eq!(left, right);
        assert_ne!(left, right.push("x", Value::Int(1)));
    }
}
