//! Single-active-member bookkeeping over a collection of elements.

use log::debug;

use crate::page::PageDocument;

/// Keeps at most one element of a collection carrying the active class.
#[derive(Debug, Clone)]
pub struct ActiveSetCoordinator {
    class: String,
}

impl ActiveSetCoordinator {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into() }
    }

    /// Clear the active class across `collection`, then set it on `winner`.
    ///
    /// `None` leaves the current distribution untouched: losing sight of
    /// every section keeps the last highlight.
    pub fn activate<P: PageDocument>(
        &self,
        page: &mut P,
        collection: &[P::Element],
        winner: Option<P::Element>,
    ) {
        let Some(winner) = winner else {
            return;
        };
        for &el in collection {
            if page.has_class(el, &self.class) {
                page.remove_class(el, &self.class);
            }
        }
        page.add_class(winner, &self.class);
        debug!("active set: {winner:?} now carries '{}'", self.class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    #[test]
    fn exactly_one_active_after_activate() {
        let mut page = FakePage::new(100.0, 100.0);
        let els: Vec<_> = (0..5)
            .map(|i| page.section(&format!("s{i}"), 0.0, 10.0))
            .collect();
        page.set_class(els[0], "active");
        page.set_class(els[3], "active");

        let coord = ActiveSetCoordinator::new("active");
        coord.activate(&mut page, &els, Some(els[2]));
        assert_eq!(page.active("active"), vec![els[2]]);
    }

    #[test]
    fn none_winner_is_noop() {
        let mut page = FakePage::new(100.0, 100.0);
        let a = page.section("a", 0.0, 10.0);
        let b = page.section("b", 10.0, 20.0);
        page.set_class(b, "active");

        let coord = ActiveSetCoordinator::new("active");
        coord.activate(&mut page, &[a, b], None);
        assert_eq!(page.active("active"), vec![b]);
    }

    #[test]
    fn idempotent() {
        let mut page = FakePage::new(100.0, 100.0);
        let a = page.section("a", 0.0, 10.0);
        let b = page.section("b", 10.0, 20.0);
        let coord = ActiveSetCoordinator::new("current");
        coord.activate(&mut page, &[a, b], Some(a));
        coord.activate(&mut page, &[a, b], Some(a));
        assert_eq!(page.active("current"), vec![a]);
        assert!(page.active("active").is_empty());
    }
}
