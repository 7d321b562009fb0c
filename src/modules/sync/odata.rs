//! Fluent OData query-string builder for the upstream feed. Reimplemented locally
//! rather than imported — the `reso_client`-style `QueryBuilder` this is grounded on
//! pulls in a whole RESO client crate for what is, in the end, about forty lines of
//! string assembly fully determined by the OData spec. Not worth a speculative
//! dependency for that.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct ODataQuery {
    filters: Vec<String>,
    expand: Vec<String>,
    select: Vec<String>,
    top: Option<u64>,
    order_by: Option<String>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filters.push(clause.into());
        self
    }

    pub fn expand(mut self, fields: &[&str]) -> Self {
        self.expand = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(n);
        self
    }

    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = Some(format!("{field} asc"));
        self
    }

    /// Builds the `path?query` string for an initial request (a `nextLink` page
    /// replaces this entirely, so this is only ever used for page one of a resource).
    pub fn build(&self, path: &str) -> String {
        let mut parts = Vec::new();

        if !self.filters.is_empty() {
            parts.push(format!("$filter={}", self.filters.join(" and ")));
        }
        if !self.expand.is_empty() {
            parts.push(format!("$expand={}", self.expand.join(",")));
        }
        if !self.select.is_empty() {
            parts.push(format!("$select={}", self.select.join(",")));
        }
        if let Some(top) = self.top {
            parts.push(format!("$top={top}"));
        }
        if let Some(order_by) = &self.order_by {
            parts.push(format!("$orderby={order_by}"));
        }

        if parts.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", parts.join("&"))
        }
    }
}

/// Formats the `ModificationTimestamp gt <ISO-8601>` high-water-mark filter clause.
pub fn hwm_filter(field: &str, hwm: DateTime<Utc>) -> String {
    format!("{field} gt {}", hwm.to_rfc3339())
}

pub fn originating_system_filter(originating_system: &str) -> String {
    format!("OriginatingSystemName eq '{originating_system}'")
}

pub fn visibility_filter(visible: bool) -> String {
    format!("MlgCanView eq {visible}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn build_joins_filters_with_and() {
        let q = ODataQuery::new()
            .filter(originating_system_filter("ABOR"))
            .filter(visibility_filter(true))
            .order_by_asc("ModificationTimestamp")
            .top(100);

        let built = q.build("/Property");
        assert!(built.starts_with("/Property?$filter="));
        assert!(built.contains("OriginatingSystemName eq 'ABOR' and MlgCanView eq true"));
        assert!(built.contains("$orderby=ModificationTimestamp asc"));
        assert!(built.contains("$top=100"));
    }

    #[test]
    fn build_without_any_clauses_is_bare_path() {
        let q = ODataQuery::new();
        assert_eq!(q.build("/Member"), "/Member");
    }

    #[test]
    fn hwm_filter_uses_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            hwm_filter("ModificationTimestamp", ts),
            "ModificationTimestamp gt 2025-01-01T00:00:00+00:00"
        );
    }
}
