//! Persistent routes: extending a route shares its prefix instead of
//! copying it, so sibling branches can never alias each other's tail.

use std::sync::Arc;

#[derive(Debug)]
struct Link {
    title: String,
    parent: Option<Arc<Link>>,
}

/// Pages from the traversal root to the page currently being visited.
#[derive(Debug, Clone)]
pub struct Route {
    head: Arc<Link>,
    root: Arc<str>,
    len: usize,
}

impl Route {
    /// A route holding only the root.
    pub fn start(root: &str) -> Self {
        Self {
            head: Arc::new(Link {
                title: root.to_string(),
                parent: None,
            }),
            root: Arc::from(root),
            len: 1,
        }
    }

    /// A new route one page longer; `self` is unchanged.
    pub fn extend(&self, title: &str) -> Self {
        Self {
            head: Arc::new(Link {
                title: title.to_string(),
                parent: Some(Arc::clone(&self.head)),
            }),
            root: Arc::clone(&self.root),
            len: self.len + 1,
        }
    }

    /// `route[0]`.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The page currently being visited.
    pub fn last(&self) -> &str {
        &self.head.title
    }

    /// Number of pages, root included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Hops from the root.
    pub fn depth(&self) -> usize {
        self.len - 1
    }

    /// Titles in root-first order.
    pub fn to_vec(&self) -> Vec<String> {
        let mut titles = Vec::with_capacity(self.len);
        let mut cursor = Some(&self.head);
        while let Some(link) = cursor {
            titles.push(link.title.clone());
            cursor = link.parent.as_ref();
        }
        titles.reverse();
        titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_has_only_root() {
        let route = Route::start("A");
        assert_eq!(route.to_vec(), vec!["A"]);
        assert_eq!(route.root(), "A");
        assert_eq!(route.last(), "A");
        assert_eq!(route.depth(), 0);
    }

    #[test]
    fn extend_leaves_original_untouched() {
        let base = Route::start("A").extend("B");
        let left = base.extend("C");
        let right = base.extend("D");
        assert_eq!(base.to_vec(), vec!["A", "B"]);
        assert_eq!(left.to_vec(), vec!["A", "B", "C"]);
        assert_eq!(right.to_vec(), vec!["A", "B", "D"]);
        assert_eq!(right.len(), 3);
        assert_eq!(right.root(), "A");
    }
}
