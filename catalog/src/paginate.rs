use serde::Serialize;

pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: usize,
    pub per_page: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Slice `ids` into one page. An out-of-range `page` is clamped to the
/// last page; an empty input still reports one page.
///
/// `page >= 1` and `per_page >= 1` are validated by the caller; zero values
/// are treated as 1 here so the arithmetic never underflows.
pub fn paginate<T>(ids: &[T], page: usize, per_page: usize) -> (&[T], PageInfo) {
    let per_page = per_page.max(1);
    let total = ids.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let current_page = page.clamp(1, total_pages);
    let start = ((current_page - 1) * per_page).min(total);
    let end = (start + per_page).min(total);
    let info = PageInfo { total, per_page, current_page, total_pages };
    (&ids[start..end], info)
}
