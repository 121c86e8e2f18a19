//! Pagination over the rows that pass the filter.

use tracing::trace;

use crate::domain::DEFAULT_PER_PAGE;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    current_page: usize,
    per_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl PageState {
    pub fn new(per_page: usize) -> Self {
        Self {
            current_page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Takes effect, clamped, on the next recompute.
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page;
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
    }

    pub fn total_pages(&self, visible: usize) -> usize {
        visible.div_ceil(self.per_page).max(1)
    }

    /// Clamp the current page into `[1, total_pages]` and return the resulting window.
    pub fn window(&mut self, visible: usize) -> PageWindow {
        let total_pages = self.total_pages(visible);
        self.current_page = self.current_page.clamp(1, total_pages);
        let start = (self.current_page - 1) * self.per_page;
        PageWindow {
            total_pages,
            current_page: self.current_page,
            per_page: self.per_page,
            visible,
            start: start.min(visible),
            end: (start + self.per_page).min(visible),
        }
    }
}

/// The slice `[start, end)` of the filtered rows that is on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: usize,
    pub visible: usize,
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    /// Window showing every filtered row, used when pagination is off.
    pub fn unpaged(visible: usize) -> Self {
        Self {
            total_pages: 1,
            current_page: 1,
            per_page: visible.max(1),
            visible,
            start: 0,
            end: visible,
        }
    }

    pub fn contains(&self, filtered_position: usize) -> bool {
        (self.start..self.end).contains(&filtered_position)
    }
}

/// Page membership per row. Rows failing the filter are never on a page and do not count
/// towards slice positions.
pub fn membership(passes: &[bool], window: &PageWindow) -> Vec<bool> {
    let mut position = 0;
    passes
        .iter()
        .map(|&passes| {
            if !passes {
                return false;
            }
            let on_page = window.contains(position);
            position += 1;
            on_page
        })
        .collect()
}

/// Recompute which filtered rows are on the current page.
pub fn recompute_page(store: &mut RecordStore, state: &mut PageState, paginate: bool) -> PageWindow {
    let passes: Vec<bool> = store.rows().map(|r| r.passes_filter).collect();
    let visible = passes.iter().filter(|&&p| p).count();
    let window = if paginate {
        state.window(visible)
    } else {
        // A single page holds every row.
        state.set_current_page(1);
        PageWindow::unpaged(visible)
    };

    for (row, on_page) in store.rows_mut().zip(membership(&passes, &window)) {
        row.on_current_page = on_page;
    }
    trace!(
        "Page {}/{}: rows {}..{} of {}",
        window.current_page, window.total_pages, window.start, window.end, visible
    );
    window
}

/// Jump to `page`. Out of range pages are clamped.
pub fn go_to_page(store: &mut RecordStore, state: &mut PageState, page: usize) -> PageWindow {
    state.set_current_page(page);
    recompute_page(store, state, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Page buttons to show: all pages up to seven, otherwise first, last, and the neighbours of
/// `current`, with ellipses over the gaps.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageItem> {
    if total <= 7 {
        return (1..=total).map(PageItem::Page).collect();
    }

    let mut pages = vec![PageItem::Page(1)];
    if current > 3 {
        pages.push(PageItem::Ellipsis);
    }
    let from = current.saturating_sub(1).max(2);
    let to = (current + 1).min(total - 1);
    pages.extend((from..=to).map(PageItem::Page));
    if current + 2 < total {
        pages.push(PageItem::Ellipsis);
    }
    pages.push(PageItem::Page(total));
    pages
}

pub fn info_text(window: &PageWindow) -> String {
    let start = if window.visible == 0 { 0 } else { window.start + 1 };
    format!("Showing {} to {} of {} entries", start, window.end, window.visible)
}

/// One element of the pagination control widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Prev { target: usize, disabled: bool },
    Page { number: usize, active: bool },
    Ellipsis,
    Next { target: usize, disabled: bool },
}

impl Control {
    /// Page a click on this control navigates to.
    pub fn target(&self) -> Option<usize> {
        match *self {
            Control::Prev { target, disabled: false } | Control::Next { target, disabled: false } => {
                Some(target)
            }
            Control::Page { number, .. } => Some(number),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Control::Prev { .. } => "‹".to_string(),
            Control::Next { .. } => "›".to_string(),
            Control::Ellipsis => "...".to_string(),
            Control::Page { number, .. } => number.to_string(),
        }
    }
}

pub fn controls(window: &PageWindow) -> Vec<Control> {
    let current = window.current_page;
    let total = window.total_pages;
    let mut controls = vec![Control::Prev {
        target: current.saturating_sub(1),
        disabled: current == 1,
    }];
    controls.extend(page_numbers(current, total).into_iter().map(|item| match item {
        PageItem::Page(number) => Control::Page { number, active: number == current },
        PageItem::Ellipsis => Control::Ellipsis,
    }));
    controls.push(Control::Next {
        target: current + 1,
        disabled: current == total,
    });
    controls
}
