//! Search, tag filter and ordering over books.
//!
//! The same [`BookQuery`] drives both the store-side select
//! ([`BookQuery::to_store_query`]) and the in-memory pass ([`BookQuery::apply`]).
//! Remote results are always finished with `apply`, so both paths return the
//! same order for the same input set.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use bookshelf_db::{Filter, Order, Query};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::models::Book;

/// Wire values: `title_asc`, `title_desc`, `newest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TitleAsc,
    TitleDesc,
    Newest,
}

impl SortKey {
    /// Parse a wire value; absent or unknown values fall back to `default`.
    pub fn parse_or(raw: Option<&str>, default: SortKey) -> SortKey {
        match raw.map(str::trim) {
            Some("title_asc") => SortKey::TitleAsc,
            Some("title_desc") => SortKey::TitleDesc,
            Some("newest") => SortKey::Newest,
            _ => default,
        }
    }

    fn compare(&self, a: &SortFields, b: &SortFields) -> Ordering {
        let primary = match self {
            SortKey::TitleAsc => a
                .folded_title
                .cmp(&b.folded_title)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            SortKey::TitleDesc => b
                .folded_title
                .cmp(&a.folded_title)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            SortKey::Newest => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| a.folded_title.cmp(&b.folded_title)),
        };
        primary
            .then_with(|| a.title.cmp(b.title))
            .then_with(|| a.id.cmp(b.id))
    }
}

/// Precomputed sort columns for one book.
struct SortFields<'a> {
    folded_title: String,
    // `None` (absent or unparseable) orders before every real timestamp.
    created_at: Option<OffsetDateTime>,
    title: &'a str,
    id: &'a str,
}

impl<'a> SortFields<'a> {
    fn of(book: &'a Book) -> Self {
        Self {
            folded_title: book.title.to_lowercase(),
            created_at: parse_timestamp(book.created_at.as_deref()),
            title: &book.title,
            id: &book.id,
        }
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
}

/// A normalized (search text, tag filter, sort key) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    search: Option<String>,
    tag: Option<String>,
    sort: SortKey,
}

impl BookQuery {
    /// Blank search text or tag means "no filter".
    pub fn new(search: Option<&str>, tag: Option<&str>, sort: SortKey) -> Self {
        Self {
            search: non_blank(search),
            tag: non_blank(tag),
            sort,
        }
    }

    /// Everything, in the given order.
    pub fn all(sort: SortKey) -> Self {
        Self::new(None, None, sort)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Case-insensitive title substring match plus exact tag membership.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(search) = &self.search {
            if !book.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !book.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }

    /// Filter and sort an already-fetched collection.
    pub fn apply<I>(&self, books: I) -> Vec<Book>
    where
        I: IntoIterator<Item = Book>,
    {
        let mut kept: Vec<Book> = books.into_iter().filter(|b| self.matches(b)).collect();
        let order: Vec<usize> = {
            let keys: Vec<SortFields<'_>> = kept.iter().map(SortFields::of).collect();
            let mut order: Vec<usize> = (0..kept.len()).collect();
            order.sort_by(|&a, &b| self.sort.compare(&keys[a], &keys[b]));
            order
        };

        let mut slots: Vec<Option<Book>> = kept.drain(..).map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect()
    }

    /// The equivalent select for the managed store.
    pub fn to_store_query(&self) -> Query {
        let mut query = Query::select("*");
        if let Some(search) = &self.search {
            query = query.filter(Filter::ilike_contains("title", search.as_str()));
        }
        if let Some(tag) = &self.tag {
            query = query.filter(Filter::contains("tags", [tag.as_str()]));
        }
        match self.sort {
            SortKey::TitleAsc => query
                .order(Order::asc("title"))
                .order(Order::desc("created_at").nulls_last()),
            SortKey::TitleDesc => query
                .order(Order::desc("title"))
                .order(Order::desc("created_at").nulls_last()),
            SortKey::Newest => query
                .order(Order::desc("created_at").nulls_last())
                .order(Order::asc("title")),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Every tag used by `books`, deduplicated and in ascending order.
pub fn unique_tags(books: &[Book]) -> Vec<String> {
    books
        .iter()
        .flat_map(|book| book.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
