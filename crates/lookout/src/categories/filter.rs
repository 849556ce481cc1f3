//! Hierarchical multi-select category navigation.
//!
//! Every item links to the filter state reached by toggling that item:
//! clicking an active category removes its alias, clicking an inactive one
//! adds it, and all other selected aliases are kept. Deeper levels are
//! matched against the same, unmodified selection so several branches can
//! be active at once.

use std::collections::HashSet;

use argus_common::{ActiveSelection, CategoryNode, RenderItem};

use super::catalog::Catalog;
use super::url::UrlBuilder;
use crate::config::FilterConfig;

/// Renders one configured filter against the catalog
pub struct CategoryTreeFilter<'a> {
    catalog: &'a dyn Catalog,
    urls: &'a dyn UrlBuilder,
    config: &'a FilterConfig,
}

impl<'a> CategoryTreeFilter<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        urls: &'a dyn UrlBuilder,
        config: &'a FilterConfig,
    ) -> Self {
        Self {
            catalog,
            urls,
            config,
        }
    }

    /// Render the navigation below `root_id`. Empty when nothing is eligible.
    pub fn render(&self, root_id: u32, selection: &ActiveSelection) -> Vec<RenderItem> {
        let ids = self.eligible_ids(root_id);
        if ids.is_empty() {
            tracing::debug!(filter = %self.config.name, root_id, "No categories to render");
            return Vec::new();
        }

        let any_active = self.any_selected(&ids, selection);

        let mut items = self.render_level(root_id, &ids, selection, 1);

        if self.config.reset_categories && !items.is_empty() {
            items.insert(0, self.reset_item(!any_active));
        }

        items
    }

    /// Ancestor-closure of the matched categories: every matched id plus
    /// all ids on the way up to the top level
    pub fn eligible_ids(&self, root_id: u32) -> HashSet<u32> {
        self.matched_categories(root_id)
            .into_iter()
            .flat_map(|id| self.catalog.ancestor_ids(id))
            .collect()
    }

    /// Canonical URL for a filtered page, when enabled and a selected alias
    /// resolves to a category this filter offers below `root_id`
    pub fn canonical_url(&self, root_id: u32, selection: &ActiveSelection) -> Option<String> {
        if !self.config.enable_canonical_urls {
            return None;
        }

        let ids = self.eligible_ids(root_id);
        self.any_selected(&ids, selection)
            .then(|| self.urls.absolute_url())
    }

    fn any_selected(&self, ids: &HashSet<u32>, selection: &ActiveSelection) -> bool {
        selection
            .iter()
            .filter_map(|alias| self.catalog.find_published_by_alias(alias))
            .any(|category| ids.contains(&category.id))
    }

    fn matched_categories(&self, root_id: u32) -> Vec<u32> {
        if self.config.category_ids.is_empty() {
            return self
                .catalog
                .published_descendants(root_id)
                .into_iter()
                .map(|category| category.id)
                .collect();
        }

        self.config
            .category_ids
            .iter()
            .copied()
            .filter(|&id| self.catalog.find_published_by_id(id).is_some())
            .collect()
    }

    fn render_level(
        &self,
        parent_id: u32,
        ids: &HashSet<u32>,
        selection: &ActiveSelection,
        level: u32,
    ) -> Vec<RenderItem> {
        let next_level = level + 1;
        let descend = self.config.max_depth == 0 || self.config.max_depth >= next_level;

        self.catalog
            .find_published_children(parent_id, ids)
            .into_iter()
            .map(|category| {
                let is_active = selection.contains(&category.alias);
                let url = self.toggle_url(&selection.toggled(&category.alias));

                let children = if descend {
                    self.render_level(category.id, ids, selection, next_level)
                } else {
                    Vec::new()
                };

                RenderItem {
                    url,
                    label: category.title.clone(),
                    title: category.title.clone(),
                    css_class: item_css_class(category, is_active, &children),
                    is_active,
                    level,
                    quantity: self.config.show_quantity.then_some(category.quantity),
                    children,
                    category: Some(category.clone()),
                }
            })
            .collect()
    }

    fn toggle_url(&self, next: &ActiveSelection) -> String {
        if next.is_empty() {
            return self.urls.frontend_url(None);
        }

        let suffix = format!(
            "/{}/{}",
            self.config.param_name,
            next.encode(&self.config.separator)
        );
        self.urls.frontend_url(Some(&suffix))
    }

    fn reset_item(&self, is_active: bool) -> RenderItem {
        RenderItem {
            url: self.urls.frontend_url(None),
            label: self.config.reset_label.clone(),
            title: self.config.reset_title.clone(),
            css_class: if is_active { "reset active" } else { "reset" }.to_string(),
            is_active,
            level: 1,
            quantity: None,
            children: Vec::new(),
            category: None,
        }
    }
}

fn item_css_class(category: &CategoryNode, is_active: bool, children: &[RenderItem]) -> String {
    let mut classes = vec![format!("news_category_{}", category.id)];

    if let Some(extra) = category.css_class.as_deref().map(str::trim) {
        if !extra.is_empty() {
            classes.push(extra.to_string());
        }
    }
    if !children.is_empty() {
        classes.push("submenu".to_string());
    }
    if is_active {
        classes.push("active".to_string());
    } else if in_trail(children) {
        classes.push("trail".to_string());
    }

    classes.join(" ")
}

/// True if any descendant item is active
fn in_trail(items: &[RenderItem]) -> bool {
    items
        .iter()
        .any(|item| item.is_active || in_trail(&item.children))
}
