//! Ordered, case-insensitive header multi-map.

/// Header fields in insertion order, each name mapping to one or more values.
///
/// Names are matched case-insensitively; the spelling of the first insertion
/// is kept. Values of one name stay in the order they were added, which
/// matters for fields such as `Set-Cookie`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` after any existing values of `name`.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        match self.position(name) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self.entries.push((name.to_owned(), vec![value.into()])),
        }
    }

    /// Replaces every existing value of `name` with `value`.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        match self.position(name) {
            Some(i) => self.entries[i].1 = vec![value.into()],
            None => self.entries.push((name.to_owned(), vec![value.into()])),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let i = self.position(name)?;
        Some(self.entries.remove(i).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values of `name`, empty when absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(i) => &self.entries[i].1,
            None => &[],
        }
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values of `name` joined with `", "`, or an empty string.
    pub fn line(&self, name: &str) -> String {
        self.get_all(name).join(", ")
    }

    /// Iterates `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_every_value_in_order() {
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("set-cookie", "b=2");
        assert_eq!(h.get_all("SET-COOKIE"), ["a=1", "b=2"]);
        assert_eq!(h.len(), 1);
        assert_eq!(h.line("set-cookie"), "a=1, b=2");
    }

    #[test]
    fn insert_replaces_existing_values() {
        let mut h = Headers::new();
        h.append("Content-Type", "text/plain");
        h.append("Content-Type", "text/html");
        h.insert("content-type", "application/json");
        assert_eq!(h.get_all("Content-Type"), ["application/json"]);
    }

    #[test]
    fn names_keep_insertion_order_and_first_spelling() {
        let h: Headers = [("X-B", "1"), ("x-a", "2"), ("x-b", "3")].into_iter().collect();
        let names: Vec<&str> = h.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["X-B", "x-a"]);
    }

    #[test]
    fn missing_header_is_empty() {
        let mut h = Headers::new();
        assert!(h.get("Content-Length").is_none());
        assert_eq!(h.line("Content-Length"), "");
        assert!(h.remove("Content-Length").is_none());
    }
}
