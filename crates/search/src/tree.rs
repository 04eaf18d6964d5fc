use crate::engine::{folder_prefix, SearchEngine};
use crate::error::{Result, SearchError};
use std::collections::BTreeMap;

/// Lazily materialized folder tree.
///
/// Folders start collapsed. [`TreeNode::expand`] fills in exactly one level;
/// deeper levels stay collapsed until expanded themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Folder {
        children: BTreeMap<String, TreeNode>,
        expanded: bool,
    },
    File,
}

impl TreeNode {
    /// Collapsed folder.
    pub fn folder() -> Self {
        TreeNode::Folder {
            children: BTreeMap::new(),
            expanded: false,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, TreeNode::Folder { .. })
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, TreeNode::Folder { expanded: true, .. })
    }

    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        match self {
            TreeNode::Folder { children, .. } => Some(children),
            TreeNode::File => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children()?.get(name)
    }

    /// Populate the immediate children of this folder, which sits at `path`.
    ///
    /// Expanding an already expanded folder leaves it untouched. Returns the
    /// number of children.
    pub fn expand(&mut self, path: &str, engine: &SearchEngine<'_>) -> Result<usize> {
        let TreeNode::Folder { children, expanded } = self else {
            return Err(SearchError::NotAFolder(path.to_string()));
        };
        if !*expanded {
            for entry in engine.list_immediate_children(path) {
                let node = if entry.is_leaf {
                    TreeNode::File
                } else {
                    TreeNode::folder()
                };
                children.insert(entry.name, node);
            }
            *expanded = true;
        }
        Ok(children.len())
    }

    /// Expand every folder on the way from this root down to `path`,
    /// including `path` itself.
    pub fn expand_path(&mut self, path: &str, engine: &SearchEngine<'_>) -> Result<&mut TreeNode> {
        let mut node = self;
        let mut current = String::new();
        node.expand(&current, engine)?;

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = format!("{}{segment}", folder_prefix(&current));
            node = match node {
                TreeNode::Folder { children, .. } => children
                    .get_mut(segment)
                    .ok_or_else(|| SearchError::NotAFolder(current.clone()))?,
                TreeNode::File => return Err(SearchError::NotAFolder(current)),
            };
            node.expand(&current, engine)?;
        }
        Ok(node)
    }

    /// Number of materialized nodes below this one.
    pub fn materialized(&self) -> usize {
        self.children()
            .map(|children| children.values().map(|c| 1 + c.materialized()).sum())
            .unwrap_or(0)
    }
}
