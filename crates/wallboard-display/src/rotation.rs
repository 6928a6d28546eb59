use std::collections::BTreeMap;

use serde::Serialize;
use wallboard_core::PanelKey;

/// What a timer expiry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    /// Same panel, next page.
    Page,
    /// Moved on to the next panel (possibly wrapping to the first).
    Panel,
}

/// Panel Rotation Scheduler state.
///
/// Reset contract:
/// * a different panel order puts the rotation back on index 0 and every
///   page index back on 0;
/// * a changed item count for a panel puts that panel's page index back on 0.
///
/// The caller owns the timer: after every [`advance`](Self::advance) it asks
/// [`next_dwell_panel`](Self::next_dwell_panel) whether a timer should run at all.
#[derive(Debug, Clone)]
pub struct PanelRotation {
    order: Vec<PanelKey>,
    index: usize,
    pages: BTreeMap<PanelKey, usize>,
    page_counts: BTreeMap<PanelKey, usize>,
}

impl PanelRotation {
    pub fn new(order: Vec<PanelKey>) -> Self {
        Self {
            order: non_empty(order),
            index: 0,
            pages: BTreeMap::new(),
            page_counts: BTreeMap::new(),
        }
    }

    pub fn order(&self) -> &[PanelKey] {
        &self.order
    }

    /// Replace the panel order. Returns true when it actually changed.
    pub fn set_order(&mut self, order: Vec<PanelKey>) -> bool {
        let order = non_empty(order);
        if order == self.order {
            return false;
        }
        self.order = order;
        self.index = 0;
        self.pages.clear();
        true
    }

    /// Record fresh page counts. A panel whose count differs from the last
    /// known one restarts at its first page.
    pub fn set_page_counts<I>(&mut self, counts: I)
    where
        I: IntoIterator<Item = (PanelKey, usize)>,
    {
        for (panel, count) in counts {
            let count = count.max(1);
            let previous = self.page_counts.insert(panel, count);
            if previous != Some(count) {
                self.pages.insert(panel, 0);
            }
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> PanelKey {
        self.order[self.index % self.order.len()]
    }

    pub fn page(&self) -> usize {
        self.page_of(self.current())
    }

    pub fn page_of(&self, panel: PanelKey) -> usize {
        let page = self.pages.get(&panel).copied().unwrap_or(0);
        page.min(self.page_count(panel) - 1)
    }

    pub fn page_count(&self, panel: PanelKey) -> usize {
        self.page_counts.get(&panel).copied().unwrap_or(1).max(1)
    }

    /// Handle one dwell-timer expiry.
    pub fn advance(&mut self) -> Advance {
        let panel = self.current();
        let page = self.page();
        if page + 1 < self.page_count(panel) {
            self.pages.insert(panel, page + 1);
            return Advance::Page;
        }
        self.pages.insert(panel, 0);
        self.index = (self.index + 1) % self.order.len();
        self.pages.insert(self.current(), 0);
        Advance::Panel
    }

    /// Panel whose dwell applies to the next timer, or `None` when there is
    /// nothing to rotate: a single panel with a single page.
    pub fn next_dwell_panel(&self) -> Option<PanelKey> {
        let panel = self.current();
        if self.order.len() == 1 && self.page_count(panel) == 1 {
            None
        } else {
            Some(panel)
        }
    }
}

fn non_empty(order: Vec<PanelKey>) -> Vec<PanelKey> {
    if order.is_empty() {
        PanelKey::ALL.to_vec()
    } else {
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_before_panels() {
        let mut r = PanelRotation::new(vec![PanelKey::Overview, PanelKey::Crew]);
        r.set_page_counts([(PanelKey::Overview, 3), (PanelKey::Crew, 1)]);

        assert_eq!(r.advance(), Advance::Page);
        assert_eq!(r.page(), 1);
        assert_eq!(r.advance(), Advance::Page);
        assert_eq!(r.page(), 2);
        assert_eq!(r.advance(), Advance::Panel);
        assert_eq!(r.current(), PanelKey::Crew);
        assert_eq!(r.advance(), Advance::Panel);
        assert_eq!(r.current(), PanelKey::Overview);
        assert_eq!(r.page(), 0);
    }

    #[test]
    fn index_stays_in_range() {
        for k in 1..=PanelKey::ALL.len() {
            let mut r = PanelRotation::new(PanelKey::ALL[..k].to_vec());
            r.set_page_counts([(PanelKey::Overview, 2)]);
            for _ in 0..50 {
                r.advance();
                assert!(r.index() < k);
            }
        }
    }

    #[test]
    fn empty_order_falls_back_to_default() {
        let r = PanelRotation::new(Vec::new());
        assert_eq!(r.order(), &PanelKey::ALL);
    }

    #[test]
    fn order_change_resets_to_first_panel() {
        let mut r = PanelRotation::new(PanelKey::ALL.to_vec());
        r.advance();
        r.advance();
        assert_eq!(r.index(), 2);

        assert!(!r.set_order(PanelKey::ALL.to_vec()));
        assert_eq!(r.index(), 2);

        assert!(r.set_order(vec![PanelKey::Pending, PanelKey::Calendar]));
        assert_eq!(r.index(), 0);
        assert_eq!(r.current(), PanelKey::Pending);
    }

    #[test]
    fn changed_item_count_resets_page() {
        let mut r = PanelRotation::new(vec![PanelKey::Logistics, PanelKey::Pending]);
        r.set_page_counts([(PanelKey::Logistics, 4)]);
        r.advance();
        r.advance();
        assert_eq!(r.page(), 2);

        r.set_page_counts([(PanelKey::Logistics, 4)]);
        assert_eq!(r.page(), 2);

        r.set_page_counts([(PanelKey::Logistics, 5)]);
        assert_eq!(r.page(), 0);
    }

    #[test]
    fn single_panel_single_page_needs_no_timer() {
        let mut r = PanelRotation::new(vec![PanelKey::Calendar]);
        assert_eq!(r.next_dwell_panel(), None);

        let mut paged = PanelRotation::new(vec![PanelKey::Pending]);
        paged.set_page_counts([(PanelKey::Pending, 2)]);
        assert_eq!(paged.next_dwell_panel(), Some(PanelKey::Pending));

        r.set_order(vec![PanelKey::Calendar, PanelKey::Overview]);
        assert_eq!(r.next_dwell_panel(), Some(PanelKey::Calendar));
    }
}
