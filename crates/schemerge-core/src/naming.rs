/// How names are matched by the lookup helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    /// Compare upper-cased names.
    #[default]
    CaseInsensitive,
    /// Compare names byte for byte.
    Exact,
}

impl NameMatch {
    pub fn matches(self, left: &str, right: &str) -> bool {
        match self {
            NameMatch::Exact => left == right,
            NameMatch::CaseInsensitive => left.to_uppercase() == right.to_uppercase(),
        }
    }
}
