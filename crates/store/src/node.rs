//! Tree nodes and path navigation.

use indexmap::IndexMap;

use crate::key::Segment;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Node {
    pub name: String,
    pub value: Option<String>,
    pub children: Vec<Node>,
    pub attributes: IndexMap<String, String>,
}

/// One resolved step of a path: the `index`-th child called `name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Step {
    pub name: String,
    pub index: usize,
}

impl Node {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Position in `children` of the `index`-th child called `name`.
    fn child_position(&self, name: &str, index: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.name == name)
            .nth(index)
            .map(|(position, _)| position)
    }

    pub fn at(&self, path: &[Step]) -> Option<&Node> {
        let mut node = self;
        for step in path {
            let position = node.child_position(&step.name, step.index)?;
            node = &node.children[position];
        }
        Some(node)
    }

    pub fn at_mut(&mut self, path: &[Step]) -> Option<&mut Node> {
        let mut node = self;
        for step in path {
            let position = node.child_position(&step.name, step.index)?;
            let current = node;
            node = &mut current.children[position];
        }
        Some(node)
    }

    /// Every descendant matched by `segments`, with its path relative to `self`, in document order.
    pub fn select(&self, segments: &[Segment]) -> Vec<(Vec<Step>, &Node)> {
        let mut current: Vec<(Vec<Step>, &Node)> = vec![(Vec::new(), self)];
        for segment in segments {
            let mut next = Vec::new();
            for (path, node) in current {
                let same_named = node.children.iter().filter(|child| child.name == segment.name);
                for (index, child) in same_named.enumerate() {
                    if segment.index.is_some_and(|wanted| wanted != index) {
                        continue;
                    }
                    let mut child_path = path.clone();
                    child_path.push(Step {
                        name: child.name.clone(),
                        index,
                    });
                    next.push((child_path, child));
                }
            }
            current = next;
        }
        current
    }

    /// Walks `segments`, creating missing children on the way. Unindexed segments reuse the first
    /// matching child.
    pub fn ensure(&mut self, segments: &[Segment]) -> &mut Node {
        let mut node = self;
        for segment in segments {
            let wanted = segment.index.unwrap_or(0);
            let position = match node.child_position(&segment.name, wanted) {
                Some(position) => position,
                None => {
                    node.children.push(Node::named(segment.name.clone()));
                    node.children.len() - 1
                }
            };
            let current = node;
            node = &mut current.children[position];
        }
        node
    }

    /// Removes the child addressed by the last step of `path`.
    pub fn remove(&mut self, path: &[Step]) -> Option<Node> {
        let (last, parents) = path.split_last()?;
        let parent = self.at_mut(parents)?;
        let position = parent.child_position(&last.name, last.index)?;
        Some(parent.children.remove(position))
    }

    /// Keys of every attribute and valued descendant, relative to this node.
    ///
    /// Indices are only rendered for names that repeat among siblings.
    pub fn collect_keys(&self, prefix: &str, delimiter: &str, out: &mut Vec<String>) {
        for attribute in self.attributes.keys() {
            out.push(format!("{prefix}[@{attribute}]"));
        }
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for child in &self.children {
            *counts.entry(child.name.as_str()).or_default() += 1;
        }
        let mut seen: IndexMap<&str, usize> = IndexMap::new();
        for child in &self.children {
            let index = seen.entry(child.name.as_str()).or_default();
            let segment = if counts.get(child.name.as_str()).copied().unwrap_or(0) > 1 {
                format!("{}({})", child.name, index)
            } else {
                child.name.clone()
            };
            *index += 1;

            let key = if prefix.is_empty() {
                segment
            } else {
                format!("{prefix}{delimiter}{segment}")
            };
            if child.value.is_some() {
                out.push(key.clone());
            }
            child.collect_keys(&key, delimiter, out);
        }
    }
}

pub(crate) fn render_path(path: &[Step], delimiter: &str) -> String {
    path.iter()
        .map(|step| format!("{}({})", step.name, step.index))
        .collect::<Vec<_>>()
        .join(delimiter)
}
