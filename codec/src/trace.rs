use std::fmt;

/// One step into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Record(String),
    Field(String),
    Map,
    /// Position of a key frame whose value is not decoded yet.
    KeyAt(usize),
    Key(String),
    Val(String),
    List,
    Element(usize),
    Reference,
    Dynamic,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Record(name) => write!(f, "record({})", name),
            Segment::Field(name) => write!(f, "field[{}]", name),
            Segment::Map => write!(f, "map"),
            Segment::KeyAt(index) => write!(f, "key{}", index),
            Segment::Key(key) => write!(f, "key[{}]", key),
            Segment::Val(key) => write!(f, "val[{}]", key),
            Segment::List => write!(f, "list"),
            Segment::Element(index) => write!(f, "el{}", index),
            Segment::Reference => write!(f, "ref"),
            Segment::Dynamic => write!(f, "dyn"),
        }
    }
}

/// Stack of segments from the root to the value being visited.
///
/// Each traversal owns its trace; it is pushed on container entry, popped on
/// exit and rendered only when an error is built.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    segments: Vec<Segment>,
}

impl Trace {
    pub fn new() -> Trace {
        Trace::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Drop segments until only `depth` remain.
    pub fn truncate(&mut self, depth: usize) {
        self.segments.truncate(depth);
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for segment in &self.segments {
            write!(f, "{}/", segment)?;
        }
        Ok(())
    }
}

/// Short label for a map key in a trace segment. Long strings are cut so a
/// single key cannot flood the message.
pub(crate) fn key_label(key: &gbin_schema::Value) -> String {
    use gbin_schema::Value;

    const MAX_LABEL: usize = 32;
    match key {
        Value::String(s) if s.chars().count() > MAX_LABEL => {
            let cut: String = s.chars().take(MAX_LABEL).collect();
            format!("{}...", cut)
        }
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.kind().name().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbin_schema::Value;

    #[test]
    fn render_nested() {
        let mut trace = Trace::new();
        assert_eq!(trace.render(), "/");

        trace.push(Segment::Record("User".to_owned()));
        trace.push(Segment::Field("tags".to_owned()));
        trace.push(Segment::List);
        trace.push(Segment::Element(3));
        assert_eq!(trace.render(), "/record(User)/field[tags]/list/el3/");
        assert_eq!(trace.depth(), 4);

        trace.pop();
        trace.pop();
        trace.push(Segment::Map);
        trace.push(Segment::Val("k".to_owned()));
        assert_eq!(trace.render(), "/record(User)/field[tags]/map/val[k]/");
    }

    #[test]
    fn key_labels() {
        assert_eq!(key_label(&Value::from("abc")), "abc");
        assert_eq!(key_label(&Value::Int(-4)), "-4");
        assert_eq!(key_label(&Value::List(vec![])), "list");
        let long = "x".repeat(40);
        assert_eq!(key_label(&Value::from(long.as_str())), format!("{}...", "x".repeat(32)));
    }
}
