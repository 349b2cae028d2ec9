use schemerge_core::NameMatch;

/// Options that control how a schema snapshot is loaded.
#[derive(Debug, Clone, Default)]
pub struct IntrospectOptions {
    /// Only load these tables. `None` loads every base table.
    pub tables: Option<Vec<String>>,
    /// Tables never loaded, even when listed in `tables`.
    pub exclude_tables: Vec<String>,
    /// Load a table without relations when its creation DDL cannot be
    /// scanned, instead of failing the whole load.
    pub skip_unparsed_relations: bool,
    pub name_match: NameMatch,
}

impl IntrospectOptions {
    pub fn includes(&self, table: &str) -> bool {
        let listed = match &self.tables {
            Some(list) => list.iter().any(|name| self.name_match.matches(name, table)),
            None => true,
        };
        listed
            && !self
                .exclude_tables
                .iter()
                .any(|name| self.name_match.matches(name, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_includes_everything() {
        assert!(IntrospectOptions::default().includes("users"));
    }

    #[test]
    fn exclusions_win_over_inclusions() {
        let opts = IntrospectOptions {
            tables: Some(vec!["users".to_string(), "audit".to_string()]),
            exclude_tables: vec!["AUDIT".to_string()],
            ..IntrospectOptions::default()
        };
        assert!(opts.includes("Users"));
        assert!(!opts.includes("audit"));
        assert!(!opts.includes("posts"));
    }

    #[test]
    fn exact_matching_respects_case() {
        let opts = IntrospectOptions {
            tables: Some(vec!["users".to_string()]),
            name_match: NameMatch::Exact,
            ..IntrospectOptions::default()
        };
        assert!(opts.includes("users"));
        assert!(!opts.includes("Users"));
    }
}
