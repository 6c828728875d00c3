use crate::base::error::FetchError;

/// A header multimap that preserves insertion order and the original key
/// casing for emission, with case-insensitive lookup.
///
/// The standard library maps lose ordering and `http::HeaderName` lowercases
/// keys, so requests framed from this map would not reproduce the caller's
/// header text byte-for-byte; hence the bespoke container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set a header: updates the first case-insensitive match in place and
    /// drops any later duplicates, else appends.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), FetchError> {
        validate(name, value)?;
        let mut found = false;
        self.entries.retain_mut(|(n, v)| {
            if n.eq_ignore_ascii_case(name) {
                if found {
                    return false;
                }
                found = true;
                *v = value.to_owned();
            }
            true
        });
        if !found {
            self.entries.push((name.to_owned(), value.to_owned()));
        }
        Ok(())
    }

    /// Append a header, keeping any existing entries with the same name.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), FetchError> {
        validate(name, value)?;
        self.entries.push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    /// First value for `name`, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove every entry matching `name`.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// All entries in insertion order with original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reject names and values that would corrupt the wire framing.
fn validate(name: &str, value: &str) -> Result<(), FetchError> {
    let name_ok = !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        });
    let value_ok = !value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0);
    if name_ok && value_ok {
        Ok(())
    } else {
        Err(FetchError::InvalidHeader(name.to_owned()))
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str())))
    }
}
