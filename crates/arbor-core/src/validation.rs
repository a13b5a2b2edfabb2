//! Structural invariant checks for a [`Tree`].
//!
//! [`Tree::validate`] walks every live node and reports each broken
//! invariant it finds instead of stopping at the first one. An empty result
//! means the tree is consistent:
//!
//! - the root has no parent and no siblings, and no other node lacks a parent
//! - every link points at an occupied slot
//! - `first_child`/`last_child` are both set or both unset
//! - forward and backward sibling walks are exact mirrors
//! - every non-root node is listed exactly once, under its own parent

use std::collections::HashMap;
use std::fmt;

use crate::id::Handle;
use crate::tree::{Links, Threaded, Tree};

/// Which of the five links an invariant violation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Parent,
    FirstChild,
    LastChild,
    NextSibling,
    PreviousSibling,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parent => "parent",
            Self::FirstChild => "first_child",
            Self::LastChild => "last_child",
            Self::NextSibling => "next_sibling",
            Self::PreviousSibling => "previous_sibling",
        };
        f.write_str(name)
    }
}

/// A single broken tree invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root has a parent or siblings.
    RootNotIsolated(Handle),
    /// A node other than the root has no parent.
    ExtraRoot(Handle),
    /// A link names a free or out-of-bounds slot.
    DanglingLink {
        node: Handle,
        link: LinkKind,
        target: Handle,
    },
    /// Exactly one of `first_child`/`last_child` is set.
    ChildBoundsMismatch(Handle),
    /// The boundary child has a sibling beyond the boundary.
    BoundaryHasSibling { parent: Handle, child: Handle },
    /// A child's `parent` link does not name the list it sits in.
    WrongParent { parent: Handle, child: Handle },
    /// Forward walk does not end at `last_child`, loops, or disagrees with
    /// the backward walk.
    AsymmetricSiblings(Handle),
    /// A non-root node appears `count` times across all child lists.
    ListedCount { node: Handle, count: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotIsolated(h) => write!(f, "root {h} has a parent or siblings"),
            Self::ExtraRoot(h) => write!(f, "{h} has no parent but is not the root"),
            Self::DanglingLink { node, link, target } => {
                write!(f, "{node}.{link} points at free slot {target}")
            }
            Self::ChildBoundsMismatch(h) => {
                write!(f, "{h} has only one of first_child/last_child")
            }
            Self::BoundaryHasSibling { parent, child } => {
                write!(f, "boundary child {child} of {parent} has an outer sibling")
            }
            Self::WrongParent { parent, child } => {
                write!(f, "{child} is listed under {parent} but names another parent")
            }
            Self::AsymmetricSiblings(h) => write!(f, "sibling list of {h} is not symmetric"),
            Self::ListedCount { node, count } => {
                write!(f, "{node} appears in {count} child lists")
            }
        }
    }
}

impl<T: Threaded> Tree<T> {
    /// Check every structural invariant. Returns all violations found.
    pub fn validate(&self) -> Vec<InvariantViolation> {
        let store = self.store();
        let limit = store.count();
        let mut violations = Vec::new();
        let mut listed: HashMap<Handle, usize> = HashMap::new();

        for (handle, node) in store.iter() {
            let links = *node.links();
            check_dangling(self, handle, &links, &mut violations);

            if handle == self.root() {
                if links.parent.is_some()
                    || links.next_sibling.is_some()
                    || links.previous_sibling.is_some()
                {
                    violations.push(InvariantViolation::RootNotIsolated(handle));
                }
            } else if links.parent.is_none() {
                violations.push(InvariantViolation::ExtraRoot(handle));
            }

            let (first, last) = match (links.first_child, links.last_child) {
                (None, None) => continue,
                (Some(first), Some(last)) => (first, last),
                _ => {
                    violations.push(InvariantViolation::ChildBoundsMismatch(handle));
                    continue;
                }
            };

            let forward = walk(self, first, limit, |l| l.next_sibling);
            let backward = walk(self, last, limit, |l| l.previous_sibling);

            for boundary in [(first, LinkKind::PreviousSibling), (last, LinkKind::NextSibling)] {
                let outer = self.get(boundary.0).ok().and_then(|n| match boundary.1 {
                    LinkKind::PreviousSibling => n.links().previous_sibling,
                    _ => n.links().next_sibling,
                });
                if outer.is_some() {
                    violations.push(InvariantViolation::BoundaryHasSibling {
                        parent: handle,
                        child: boundary.0,
                    });
                }
            }

            let mirrored = match (&forward, &backward) {
                (Some(f), Some(b)) => {
                    f.last() == Some(&last) && f.iter().rev().eq(b.iter())
                }
                _ => false,
            };
            if !mirrored {
                violations.push(InvariantViolation::AsymmetricSiblings(handle));
            }

            for &child in forward.iter().flatten() {
                *listed.entry(child).or_default() += 1;
                let parent = self.get(child).ok().and_then(|n| n.links().parent);
                if parent != Some(handle) {
                    violations.push(InvariantViolation::WrongParent {
                        parent: handle,
                        child,
                    });
                }
            }
        }

        for handle in store.handles() {
            if handle == self.root() {
                continue;
            }
            let count = listed.get(&handle).copied().unwrap_or(0);
            if count != 1 {
                violations.push(InvariantViolation::ListedCount {
                    node: handle,
                    count,
                });
            }
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

fn check_dangling<T: Threaded>(
    tree: &Tree<T>,
    node: Handle,
    links: &Links,
    violations: &mut Vec<InvariantViolation>,
) {
    let all = [
        (LinkKind::Parent, links.parent),
        (LinkKind::FirstChild, links.first_child),
        (LinkKind::LastChild, links.last_child),
        (LinkKind::NextSibling, links.next_sibling),
        (LinkKind::PreviousSibling, links.previous_sibling),
    ];
    for (link, target) in all {
        let Some(target) = target else { continue };
        if !tree.contains(target) {
            violations.push(InvariantViolation::DanglingLink { node, link, target });
        }
    }
}

/// Follow `step` from `start` through live nodes. `None` if the walk hits a
/// free slot or runs longer than `limit` (a loop).
fn walk<T: Threaded>(
    tree: &Tree<T>,
    start: Handle,
    limit: usize,
    step: impl Fn(&Links) -> Option<Handle>,
) -> Option<Vec<Handle>> {
    let mut out = Vec::new();
    let mut next = Some(start);
    while let Some(handle) = next {
        if out.len() >= limit {
            return None;
        }
        out.push(handle);
        next = step(tree.get(handle).ok()?.links());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn well_formed_trees_are_valid() {
        let (tree, _) = scenario_tree();
        assert_eq!(tree.validate(), vec![]);
        let (tree, _, _) = wide_tree(10);
        assert!(tree.is_valid());
    }

    #[test]
    fn broken_forward_link_is_reported() {
        let (mut tree, parent, kids) = wide_tree(3);
        tree.corrupt_links(kids[0]).unwrap().next_sibling = Some(kids[2]);
        let violations = tree.validate();
        assert!(violations.contains(&InvariantViolation::AsymmetricSiblings(parent)));
        assert!(violations.contains(&InvariantViolation::ListedCount {
            node: kids[1],
            count: 0,
        }));
    }

    #[test]
    fn sibling_loop_is_reported_not_followed_forever() {
        let (mut tree, parent, kids) = wide_tree(2);
        tree.corrupt_links(kids[1]).unwrap().next_sibling = Some(kids[0]);
        let violations = tree.validate();
        assert!(violations.contains(&InvariantViolation::AsymmetricSiblings(parent)));
        assert!(violations.contains(&InvariantViolation::BoundaryHasSibling {
            parent,
            child: kids[1],
        }));
    }

    #[test]
    fn dangling_link_is_reported() {
        let (mut tree, s) = scenario_tree();
        tree.corrupt_links(s.b).unwrap().first_child = Some(Handle(50));
        let violations = tree.validate();
        assert!(violations.contains(&InvariantViolation::DanglingLink {
            node: s.b,
            link: LinkKind::FirstChild,
            target: Handle(50),
        }));
        assert!(violations.contains(&InvariantViolation::ChildBoundsMismatch(s.b)));
    }

    #[test]
    fn orphan_is_reported_as_extra_root() {
        let (mut tree, s) = scenario_tree();
        tree.corrupt_links(s.c).unwrap().parent = None;
        let violations = tree.validate();
        assert!(violations.contains(&InvariantViolation::ExtraRoot(s.c)));
        assert!(violations.contains(&InvariantViolation::WrongParent {
            parent: s.a,
            child: s.c,
        }));
    }

    #[test]
    fn violation_display_messages() {
        let msg = InvariantViolation::DanglingLink {
            node: Handle(1),
            link: LinkKind::NextSibling,
            target: Handle(4),
        }
        .to_string();
        assert_eq!(msg, "#1.next_sibling points at free slot #4");
    }
}
