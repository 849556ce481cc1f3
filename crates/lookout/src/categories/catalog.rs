//! Category catalog: read-only lookups over the news category tree.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use argus_common::{ArgusError, CategoryNode};

/// Parent key used for top-level categories
pub const TOP_LEVEL: u32 = 0;

/// Read access to the category tree
pub trait Catalog: Send + Sync {
    fn find_published_by_id(&self, id: u32) -> Option<&CategoryNode>;

    fn find_published_by_alias(&self, alias: &str) -> Option<&CategoryNode>;

    /// Published direct children of `parent_id` whose id is in `ids`, in sort order
    fn find_published_children(&self, parent_id: u32, ids: &HashSet<u32>) -> Vec<&CategoryNode>;

    /// `id` followed by every ancestor up to the top level, published or not
    fn ancestor_ids(&self, id: u32) -> Vec<u32>;

    /// Published categories below `root_id`, reached through published parents only
    fn published_descendants(&self, root_id: u32) -> Vec<&CategoryNode>;

    fn is_empty(&self) -> bool;
}

/// Catalog held in memory, loaded once at start-up
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    nodes: Vec<CategoryNode>,
    by_id: HashMap<u32, usize>,
    by_alias: HashMap<String, usize>,
    /// Parent id -> child indices, sorted by (sorting, id)
    children: HashMap<u32, Vec<usize>>,
}

impl InMemoryCatalog {
    /// Load a JSON array of category records
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArgusError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ArgusError::Catalog(format!("{}: {}", path.display(), e)))?;
        let nodes: Vec<CategoryNode> = serde_json::from_str(&raw)
            .map_err(|e| ArgusError::Catalog(format!("{}: {}", path.display(), e)))?;

        Self::from_nodes(nodes)
    }

    /// Build and validate: non-zero unique ids, unique aliases, known parents, no cycles
    pub fn from_nodes(mut nodes: Vec<CategoryNode>) -> Result<Self, ArgusError> {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut by_alias = HashMap::with_capacity(nodes.len());

        for (idx, node) in nodes.iter_mut().enumerate() {
            if node.id == TOP_LEVEL {
                return Err(ArgusError::Catalog(format!(
                    "category '{}' has reserved id 0",
                    node.alias
                )));
            }
            if node.pid == Some(TOP_LEVEL) {
                node.pid = None;
            }
            if node.alias.is_empty() {
                return Err(ArgusError::Catalog(format!("category {} has no alias", node.id)));
            }
            if by_id.insert(node.id, idx).is_some() {
                return Err(ArgusError::Catalog(format!("duplicate category id {}", node.id)));
            }
            if by_alias.insert(node.alias.clone(), idx).is_some() {
                return Err(ArgusError::Catalog(format!(
                    "duplicate category alias '{}'",
                    node.alias
                )));
            }
        }

        let mut children: HashMap<u32, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            if let Some(pid) = node.pid {
                if !by_id.contains_key(&pid) {
                    return Err(ArgusError::Catalog(format!(
                        "category {} points at unknown parent {}",
                        node.id, pid
                    )));
                }
            }
            children.entry(node.pid.unwrap_or(TOP_LEVEL)).or_default().push(idx);
        }

        for siblings in children.values_mut() {
            siblings.sort_by_key(|&idx| (nodes[idx].sorting, nodes[idx].id));
        }

        let catalog = Self {
            nodes,
            by_id,
            by_alias,
            children,
        };
        catalog.check_acyclic()?;

        Ok(catalog)
    }

    /// Every parent chain must reach the top level within `len` steps
    fn check_acyclic(&self) -> Result<(), ArgusError> {
        for node in &self.nodes {
            let mut current = node.pid;
            let mut steps = 0;
            while let Some(pid) = current {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(ArgusError::Catalog(format!(
                        "category {} is part of a parent cycle",
                        node.id
                    )));
                }
                current = self.get(pid).and_then(|parent| parent.pid);
            }
        }
        Ok(())
    }

    fn get(&self, id: u32) -> Option<&CategoryNode> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl Catalog for InMemoryCatalog {
    fn find_published_by_id(&self, id: u32) -> Option<&CategoryNode> {
        self.get(id).filter(|node| node.published)
    }

    fn find_published_by_alias(&self, alias: &str) -> Option<&CategoryNode> {
        self.by_alias
            .get(alias)
            .map(|&idx| &self.nodes[idx])
            .filter(|node| node.published)
    }

    fn find_published_children(&self, parent_id: u32, ids: &HashSet<u32>) -> Vec<&CategoryNode> {
        self.children
            .get(&parent_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.nodes[idx])
            .filter(|node| node.published && ids.contains(&node.id))
            .collect()
    }

    fn ancestor_ids(&self, id: u32) -> Vec<u32> {
        let mut ids = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            ids.push(node.id);
            current = node.pid.and_then(|pid| self.get(pid));
        }
        ids
    }

    fn published_descendants(&self, root_id: u32) -> Vec<&CategoryNode> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([root_id]);

        while let Some(parent) = queue.pop_front() {
            for &idx in self.children.get(&parent).into_iter().flatten() {
                let node = &self.nodes[idx];
                if node.published {
                    found.push(node);
                    queue.push_back(node.id);
                }
            }
        }

        found
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
