//! PostgREST query parameter encoding.

/// A row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// Case-insensitive substring match.
    ILikeContains { column: String, needle: String },
    /// Array column contains every listed element.
    Contains { column: String, elements: Vec<String> },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ilike_contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::ILikeContains {
            column: column.into(),
            needle: needle.into(),
        }
    }

    pub fn contains<I, S>(column: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Contains {
            column: column.into(),
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{value}")),
            Filter::ILikeContains { column, needle } => {
                (column.clone(), format!("ilike.*{}*", escape_like(needle)))
            }
            Filter::Contains { column, elements } => {
                let quoted: Vec<String> = elements.iter().map(|e| quote_element(e)).collect();
                (column.clone(), format!("cs.{{{}}}", quoted.join(",")))
            }
        }
    }
}

/// One `order` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
    pub nulls_last: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
            nulls_last: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
            nulls_last: false,
        }
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self
    }

    fn encode(&self) -> String {
        let mut term = format!(
            "{}.{}",
            self.column,
            if self.ascending { "asc" } else { "desc" }
        );
        if self.nulls_last {
            term.push_str(".nullslast");
        }
        term
    }
}

/// A select over one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    select: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
}

impl Query {
    pub fn select(columns: impl Into<String>) -> Self {
        Self {
            select: columns.into(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Encode as query-string pairs, in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let terms: Vec<String> = self.order.iter().map(Order::encode).collect();
            params.push(("order".to_string(), terms.join(",")));
        }
        params
    }
}

/// Escape LIKE metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Quote one element of a Postgres array literal.
fn quote_element(element: &str) -> String {
    let escaped = element.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn bare_select_has_no_filters_or_order() {
        let params = Query::select("*").to_params();
        assert_eq!(params, vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn encodes_filters_and_order() {
        let params = Query::select("*")
            .filter(Filter::ilike_contains("title", "code"))
            .filter(Filter::contains("tags", ["IT"]))
            .order(Order::asc("title"))
            .order(Order::desc("created_at").nulls_last())
            .to_params();

        assert_eq!(param(&params, "title"), Some("ilike.*code*"));
        assert_eq!(param(&params, "tags"), Some("cs.{\"IT\"}"));
        assert_eq!(
            param(&params, "order"),
            Some("title.asc,created_at.desc.nullslast")
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        let params = Query::select("*")
            .filter(Filter::ilike_contains("title", "100%_done"))
            .to_params();
        assert_eq!(param(&params, "title"), Some("ilike.*100\\%\\_done*"));
    }

    #[test]
    fn array_elements_are_quoted() {
        let params = Query::select("*")
            .filter(Filter::contains("tags", ["Self-help, \"pop\""]))
            .to_params();
        assert_eq!(param(&params, "tags"), Some("cs.{\"Self-help, \\\"pop\\\"\"}"));
    }

    #[test]
    fn eq_filter() {
        let params = Query::select("*").filter(Filter::eq("id", "abc")).to_params();
        assert_eq!(param(&params, "id"), Some("eq.abc"));
    }
}
