//! Constructive Solid Geometry
//!
//! Solids are combined per sample. Walking the depth ordered visibility
//! list front to back, each surface of a primitive toggles whether the
//! sample ray is inside that primitive. A surface is kept only where it
//! changes whether the ray is inside the combined solid.

use std::sync::Arc;

use crate::error::{HiderError, Result};
use crate::sample::VisibilityEntry;

/// Boolean operation or leaf of a CSG tree
#[derive(Debug,Clone,PartialEq)]
pub enum CsgNode {
    /// A closed solid whose surfaces are tagged with this node's index
    Primitive,
    /// Inside any child
    Union(Vec<usize>),
    /// Inside all children
    Intersection(Vec<usize>),
    /// Inside the first child and outside all others
    Difference(Vec<usize>),
}

/// CSG tree stored as an arena, node 0 is the root
///
/// Children are always added after their parent.
#[derive(Debug,Clone,Default)]
pub struct CsgTree {
    nodes: Vec<CsgNode>,
}

impl CsgTree {
    pub fn new() -> Self {
        Self { nodes: vec![] }
    }
    /// Add a node, returning its index
    pub fn add(&mut self, node: CsgNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    fn is_primitive(&self, node: usize) -> bool {
        matches!(self.nodes.get(node), Some(CsgNode::Primitive))
    }
    fn children(&self, node: usize, kids: &[usize]) -> Result<()> {
        match kids.iter().find(|&&k| k <= node) {
            Some(&child) => Err(HiderError::CsgCycle { node, child }),
            None => Ok(()),
        }
    }
    fn inside(&self, node: usize, state: &[bool]) -> Result<bool> {
        if let Some(CsgNode::Union(kids) | CsgNode::Intersection(kids) | CsgNode::Difference(kids)) = self.nodes.get(node) {
            self.children(node, kids)?;
        }
        match self.nodes.get(node) {
            None => Err(HiderError::CsgMissingNode { node }),
            Some(CsgNode::Primitive) => Ok(state[node]),
            Some(CsgNode::Union(kids)) => {
                for &k in kids {
                    if self.inside(k, state)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            },
            Some(CsgNode::Intersection(kids)) => {
                if kids.is_empty() {
                    return Ok(false);
                }
                for &k in kids {
                    if !self.inside(k, state)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
            Some(CsgNode::Difference(kids)) => {
                let (first, rest) = match kids.split_first() {
                    Some(v) => v,
                    None => return Ok(false),
                };
                if !self.inside(*first, state)? {
                    return Ok(false);
                }
                for &k in rest {
                    if self.inside(k, state)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            },
        }
    }
    /// Remove the surfaces of this tree that are hidden inside the combined solid
    ///
    /// `entries` must be sorted front to back. Entries of other trees and
    /// non-CSG entries are left alone.
    pub fn resolve(self: &Arc<Self>, entries: &mut Vec<VisibilityEntry>) -> Result<()> {
        let mut state = vec![false; self.nodes.len()];
        let mut keep = Vec::with_capacity(entries.len());
        for e in entries.iter() {
            let node = match &e.csg {
                Some(r) if Arc::ptr_eq(&r.tree, self) => r.node,
                _ => {
                    keep.push(true);
                    continue;
                }
            };
            if !self.is_primitive(node) {
                return Err(HiderError::CsgMissingNode { node });
            }
            let before = self.inside(0, &state)?;
            state[node] = !state[node];
            let after = self.inside(0, &state)?;
            keep.push(before != after);
        }
        let mut flags = keep.into_iter();
        entries.retain(|_| flags.next().unwrap_or(true));
        Ok(())
    }
}

/// Resolve every CSG tree referenced from a sorted visibility list
pub fn resolve_all(entries: &mut Vec<VisibilityEntry>) -> Result<()> {
    let mut done: Vec<Arc<CsgTree>> = vec![];
    loop {
        let next = entries.iter()
            .filter_map(|e| e.csg.as_ref())
            .find(|r| !done.iter().any(|t| Arc::ptr_eq(t, &r.tree)))
            .map(|r| r.tree.clone());
        match next {
            Some(tree) => {
                tree.resolve(entries)?;
                done.push(tree);
            },
            None => return Ok(()),
        }
    }
}
