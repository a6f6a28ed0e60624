use std::fmt;

use sea_orm::{ConnectionTrait, DbErr, ItemsAndPagesNumber, PaginatorTrait, SelectorTrait};
use serde::Serialize;

pub const DEFAULT_PER_PAGE: u64 = 10;

/// The `page` query parameter as the visitor sent it.
///
/// Anything that is not an integer means the first page. Integers outside
/// the valid range are clamped to the last page once the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest(Option<i64>);

impl PageRequest {
    pub fn first() -> Self {
        Self(Some(1))
    }

    pub fn number(number: i64) -> Self {
        Self(Some(number))
    }

    pub fn parse(raw: Option<&str>) -> Self {
        Self(raw.and_then(|raw| raw.trim().parse().ok()))
    }

    /// Resolve against `num_pages` (at least 1), returning a 1-based page number.
    pub fn resolve(self, num_pages: u64) -> u64 {
        let num_pages = num_pages.max(1);
        match self.0 {
            None => 1,
            Some(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
            Some(_) => num_pages,
        }
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "page={n}"),
            None => f.write_str("page=1"),
        }
    }
}

/// One window of an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, number: u64, num_pages: u64, count: u64, per_page: u64) -> Self {
        Self {
            items,
            number,
            num_pages,
            count,
            per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next.then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous.then_some(self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

fn num_pages(count: u64, per_page: u64) -> u64 {
    count.div_ceil(per_page).max(1)
}

/// Slice an in-memory collection. An empty collection still has one (empty) page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest, per_page: u64) -> Page<T> {
    let per_page = per_page.max(1);
    let count = items.len() as u64;
    let num_pages = num_pages(count, per_page);
    let number = request.resolve(num_pages);

    let window = items
        .into_iter()
        .skip(((number - 1) * per_page) as usize)
        .take(per_page as usize)
        .collect();

    Page::new(window, number, num_pages, count, per_page)
}

/// Same rules as [`paginate`], but counts and fetches through the database
/// so only the requested window is loaded.
pub async fn paginate_query<'db, C, Q>(
    query: Q,
    request: PageRequest,
    per_page: u64,
    db: &'db C,
) -> Result<Page<<Q::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    Q: PaginatorTrait<'db, C>,
{
    let per_page = per_page.max(1);
    let paginator = query.paginate(db, per_page);

    let ItemsAndPagesNumber {
        number_of_items, ..
    } = paginator.num_items_and_pages().await?;
    let num_pages = num_pages(number_of_items, per_page);
    let number = request.resolve(num_pages);

    let items = paginator.fetch_page(number - 1).await?;
    Ok(Page::new(items, number, num_pages, number_of_items, per_page))
}
