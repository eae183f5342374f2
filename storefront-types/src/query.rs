//! Catalog Query Engine
//!
//! Pure functions turning a product slice plus criteria into an ordered view.
//! Results borrow from the input, so a view can only ever contain records
//! that exist in the snapshot it was computed from.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    ALL_CATEGORIES, FilterCriteria, PageRequest, Product, ProductField, ProductId, SortField,
    SortSpec,
};

/// Output of [`query`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    /// Matching records in sort order
    pub items: Vec<&'a Product>,
    /// Records of the input carrying malformed fields
    pub flagged: Vec<&'a ProductId>,
}

/// Filters and sorts `records`.
pub fn query<'a>(records: &'a [Product], criteria: &FilterCriteria, sort: &SortSpec) -> QueryResult<'a> {
    let mut items = filter(records, criteria);
    sort_by_spec(&mut items, sort);
    let flagged = records
        .iter()
        .filter(|p| p.is_flagged())
        .map(|p| &p.id)
        .collect();
    QueryResult { items, flagged }
}

/// Records satisfying every predicate of `criteria`, in input order.
pub fn filter<'a>(records: &'a [Product], criteria: &FilterCriteria) -> Vec<&'a Product> {
    let needle = criteria.search.to_lowercase();
    records
        .iter()
        .filter(|p| matches_search(p, &needle))
        .filter(|p| criteria.category.matches(&p.category))
        .filter(|p| matches_price(p, criteria))
        .collect()
}

/// Whether a single record passes `criteria`.
pub fn matches(product: &Product, criteria: &FilterCriteria) -> bool {
    matches_search(product, &criteria.search.to_lowercase())
        && criteria.category.matches(&product.category)
        && matches_price(product, criteria)
}

fn matches_search(product: &Product, needle: &str) -> bool {
    needle.is_empty()
        || product.name.to_lowercase().contains(needle)
        || product.code.to_lowercase().contains(needle)
        || product.category.to_lowercase().contains(needle)
}

// A record without a usable price cannot be shown to lie inside a bounded range.
fn matches_price(product: &Product, criteria: &FilterCriteria) -> bool {
    match product.price {
        Some(price) => criteria.price.contains(price),
        None => criteria.price.is_unbounded(),
    }
}

/// Stable sort by `spec`.
///
/// Ties keep their input order in both directions. Records lacking the sort
/// key (missing or malformed) go after all keyed records.
pub fn sort_by_spec(items: &mut [&Product], spec: &SortSpec) {
    items.sort_by(|a, b| compare(a, b, spec));
}

fn compare(a: &Product, b: &Product, spec: &SortSpec) -> Ordering {
    let direction = spec.direction;
    match spec.field {
        SortField::Name => direction.apply(compare_names(&a.name, &b.name)),
        SortField::Price => compare_keys(a.price, b.price, |x, y| direction.apply(x.cmp(&y))),
        SortField::Stock => compare_keys(a.stock, b.stock, |x, y| direction.apply(x.cmp(&y))),
        SortField::Rating => {
            compare_keys(a.rating, b.rating, |x, y| direction.apply(x.total_cmp(&y)))
        }
    }
}

fn compare_keys<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Spanish-aware name comparison.
///
/// Letters compare case- and accent-insensitively first (with `ñ` between
/// `n` and `o`), then unaccented before accented, then lower before upper case.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let primary = collate(a)
        .map(|e| e.base)
        .cmp(collate(b).map(|e| e.base));
    primary
        .then_with(|| collate(a).map(|e| e.accent).cmp(collate(b).map(|e| e.accent)))
        .then_with(|| collate(a).map(|e| e.upper).cmp(collate(b).map(|e| e.upper)))
}

struct CollationElement {
    base: u32,
    accent: bool,
    upper: bool,
}

fn collate(s: &str) -> impl Iterator<Item = CollationElement> + '_ {
    s.chars().flat_map(|c| {
        let upper = c.is_uppercase();
        c.to_lowercase().map(move |lower| {
            let (base, accent) = fold(lower);
            CollationElement { base, accent, upper }
        })
    })
}

fn fold(c: char) -> (u32, bool) {
    let (base, accent) = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => ('a', true),
        'é' | 'è' | 'ê' | 'ë' => ('e', true),
        'í' | 'ì' | 'î' | 'ï' => ('i', true),
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => ('o', true),
        'ú' | 'ù' | 'û' | 'ü' => ('u', true),
        'ç' => ('c', true),
        'ý' | 'ÿ' => ('y', true),
        'ñ' => return ('n' as u32 * 2 + 1, false),
        other => (other, false),
    };
    (base as u32 * 2, accent)
}

/// Category facets: the `"all"` sentinel followed by each distinct category
/// in order of first appearance.
pub fn facets(records: &[Product]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::from([ALL_CATEGORIES]);
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for product in records {
        if seen.insert(product.category.as_str()) {
            out.push(product.category.clone());
        }
    }
    out
}

/// Records flagged as on promotion, in input order.
pub fn promotions(records: &[Product]) -> Vec<&Product> {
    records.iter().filter(|p| p.promotion).collect()
}

/// Records whose price could not be used for filtering or sorting.
pub fn unpriced(records: &[Product]) -> Vec<&Product> {
    records
        .iter()
        .filter(|p| p.has_defect(ProductField::Price))
        .collect()
}

/// Position of a page within the full result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

/// Slices one page out of `items`.
///
/// A page size of 0 is treated as 1; pages past the end clamp to the last page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let page_size = request.page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = request.page.clamp(1, total_pages.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        info: PageInfo {
            page,
            page_size,
            total_items,
            total_pages,
        },
    }
}
