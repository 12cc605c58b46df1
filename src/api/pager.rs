use serde::Serialize;

/// Page numbers around the current page of the bookmark index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub first: Option<u64>,
    pub prev: Vec<u64>,
    pub current: Option<u64>,
    pub next: Vec<u64>,
    pub last: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: u64,
    pub href: String,
}

/// [`Pager`] with an href for every page number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PagerLinks {
    pub first: Option<PageLink>,
    pub prev: Vec<PageLink>,
    pub current: Option<u64>,
    pub next: Vec<PageLink>,
    pub last: Option<PageLink>,
}

impl Pager {
    /// Shows up to `side` pages on either side of `current`, plus shortcuts to
    /// the first and last page when the window does not reach them.
    #[must_use]
    pub fn new(current: u64, last: u64, side: u64) -> Self {
        let mut pager = Self::default();

        if last > 1 {
            pager.current = Some(current);
        }

        if current <= side + 2 {
            pager.prev = (1..current).collect();
        } else {
            pager.first = Some(1);
            pager.prev = (current - side..current).collect();
        }

        if current >= last.saturating_sub(side + 1) {
            pager.next = (current + 1..=last).collect();
        } else {
            pager.last = Some(last);
            pager.next = (current + 1..=current + side).collect();
        }

        pager
    }

    pub fn links(self, href: impl Fn(u64) -> String) -> PagerLinks {
        let link = |page: u64| PageLink {
            page,
            href: href(page),
        };

        PagerLinks {
            first: self.first.map(&link),
            prev: self.prev.into_iter().map(&link).collect(),
            current: self.current,
            next: self.next.into_iter().map(&link).collect(),
            last: self.last.map(&link),
        }
    }
}

/// Number of pages needed for `total` items; an empty listing still has one page.
#[must_use]
pub fn page_count(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_ten() {
        let pager = Pager::new(1, 10, 5);
        assert_eq!(pager.first, None);
        assert!(pager.prev.is_empty());
        assert_eq!(pager.current, Some(1));
        assert_eq!(pager.next, vec![2, 3, 4, 5, 6]);
        assert_eq!(pager.last, Some(10));
    }

    #[test]
    fn last_page_of_ten() {
        let pager = Pager::new(10, 10, 5);
        assert_eq!(pager.first, Some(1));
        assert_eq!(pager.prev, vec![5, 6, 7, 8, 9]);
        assert!(pager.next.is_empty());
        assert_eq!(pager.last, None);
    }

    #[test]
    fn middle_page_gets_both_shortcuts() {
        let pager = Pager::new(10, 20, 3);
        assert_eq!(pager.first, Some(1));
        assert_eq!(pager.prev, vec![7, 8, 9]);
        assert_eq!(pager.next, vec![11, 12, 13]);
        assert_eq!(pager.last, Some(20));
    }

    #[test]
    fn single_page_has_no_current() {
        let pager = Pager::new(1, 1, 5);
        assert_eq!(pager, Pager::default());
    }

    #[test]
    fn window_near_edges_absorbs_shortcuts() {
        // Page 7 with side 5: pages 1..7 are all shown, no shortcut
        let pager = Pager::new(7, 8, 5);
        assert_eq!(pager.first, None);
        assert_eq!(pager.prev, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(pager.next, vec![8]);
        assert_eq!(pager.last, None);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(200, 20), 10);
    }

    #[test]
    fn links_carry_hrefs() {
        let links = Pager::new(1, 3, 5).links(|page| format!("?page={page}"));
        assert_eq!(links.current, Some(1));
        assert_eq!(
            links.next,
            vec![
                PageLink {
                    page: 2,
                    href: "?page=2".to_string()
                },
                PageLink {
                    page: 3,
                    href: "?page=3".to_string()
                },
            ]
        );
    }
}
