//! Startup construction of the navigation menu.

use log::{debug, info, warn};

use crate::page::{NavigationItem, PageDocument, SectionQuery};

/// One item per marked section: its id and the marker value as label.
///
/// Sections without an id cannot be linked to and are left out.
pub fn navigation_items<P: PageDocument>(
    page: &P,
    sections: &[P::Element],
    query: &SectionQuery,
) -> Vec<NavigationItem> {
    sections
        .iter()
        .filter_map(|&s| {
            let Some(id) = page.element_id(s) else {
                debug!("menu: section {s:?} has no id, skipping");
                return None;
            };
            let label = page
                .attribute(s, &query.marker_attribute)
                .unwrap_or_else(|| id.clone());
            Some(NavigationItem { id, label })
        })
        .collect()
}

/// Materialize the menu under `container`. Returns the number of entries.
pub fn build_navigation<P: PageDocument>(
    page: &mut P,
    query: &SectionQuery,
    container: &str,
) -> usize {
    let sections = page.query_sections(query);
    if sections.is_empty() {
        info!("menu: no sections carry '{}'", query.marker_attribute);
        return 0;
    }
    let items = navigation_items(page, &sections, query);
    let fragment = page.create_navigation_fragment(&items);
    if !page.append_to_container(container, fragment) {
        warn!("menu: container '{container}' not found");
        return 0;
    }
    info!("menu: built {} entries under '{container}'", items.len());
    items.len()
}
