use std::collections::{HashMap, HashSet};

/// Whether a category groups products or services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryType {
    #[default]
    Product,
    Service,
}

impl CategoryType {
    /// Parse the API's `type` field. Anything unrecognised is treated as a product.
    pub fn from_api(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("SERVICE") => Self::Service,
            _ => Self::Product,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "PRODUCT",
            Self::Service => "SERVICE",
        }
    }
}

/// One node of the category forest.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    /// Empty when the source record had no `_id`.
    pub id: String,
    /// Empty when the source record had no `name`.
    pub name: String,
    pub kind: CategoryType,
    pub parent_id: Option<String>,
    pub description: Option<String>,
    pub thumb_url: Option<String>,
    /// Source order is kept.
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: CategoryType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            parent_id: None,
            description: None,
            thumb_url: None,
            children: Vec::new(),
        }
    }

    /// Append a child, stamping its parent id from this node.
    pub fn with_child(mut self, mut child: CategoryNode) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }
}

impl Drop for CategoryNode {
    /// Flattens the subtree first so dropping a deep chain does not recurse.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Immutable category forest built once per load.
///
/// Nesting is taken from the source as-is; no id-based re-linking happens
/// here. Traversals and drop are iterative, so deep chains do not overflow
/// the stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
}

impl CategoryTree {
    pub fn new(roots: Vec<CategoryNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Root categories of one type, in source order.
    pub fn roots_of_type(&self, kind: CategoryType) -> impl Iterator<Item = &CategoryNode> {
        self.roots.iter().filter(move |n| n.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order depth-first walk over the whole forest, children in source order.
    pub fn iter(&self) -> Nodes<'_> {
        Nodes {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// First node with this id in pre-order, if any.
    pub fn find_node(&self, node_id: &str) -> Option<&CategoryNode> {
        self.iter().find(|n| n.id == node_id)
    }

    /// The node's own id plus every id in its subtree.
    ///
    /// An unknown id yields `{node_id}` so filtering degrades to an exact match.
    pub fn collect_descendant_ids(&self, node_id: &str) -> HashSet<String> {
        let mut ids = HashSet::new();
        match self.find_node(node_id) {
            Some(node) => {
                let mut stack = vec![node];
                while let Some(current) = stack.pop() {
                    ids.insert(current.id.clone());
                    stack.extend(current.children.iter());
                }
            }
            None => {
                ids.insert(node_id.to_string());
            }
        }
        ids
    }

    /// Path from a root down to the node, both ends included.
    /// Empty when the id is unknown.
    pub fn ancestors(&self, node_id: &str) -> Vec<&CategoryNode> {
        // (node, index of parent in `visited`)
        let mut visited: Vec<(&CategoryNode, Option<usize>)> = Vec::new();
        let mut stack: Vec<(&CategoryNode, Option<usize>)> =
            self.roots.iter().rev().map(|n| (n, None)).collect();

        while let Some((node, parent)) = stack.pop() {
            let idx = visited.len();
            visited.push((node, parent));
            if node.id == node_id {
                let mut path = Vec::new();
                let mut cursor = Some(idx);
                while let Some(i) = cursor {
                    path.push(visited[i].0);
                    cursor = visited[i].1;
                }
                path.reverse();
                return path;
            }
            stack.extend(node.children.iter().rev().map(|c| (c, Some(idx))));
        }
        Vec::new()
    }

    /// Id to display name for every node. On duplicate ids the first one wins.
    pub fn names(&self) -> HashMap<&str, &str> {
        let mut names = HashMap::new();
        for node in self.iter() {
            names.entry(node.id.as_str()).or_insert(node.name.as_str());
        }
        names
    }
}

/// Iterator returned by [`CategoryTree::iter`].
pub struct Nodes<'a> {
    stack: Vec<&'a CategoryNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a CategoryNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
