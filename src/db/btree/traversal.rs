//! In-order traversal, yielding `(key, value)` pairs in ascending
//! order. Implemented as an iterator over an explicit stack rather
//! than plain recursion so it stays lazy and restartable — calling
//! [`BTree::iter`] again always starts a fresh walk from the root.

use crate::db::btree::codec::Node;
use crate::db::btree::engine::BTree;
use crate::error::EngineError;

struct Frame {
    node: Node,
    /// Index of the next key/child pair to consider.
    idx: usize,
    /// Whether `children[idx]` has already been pushed onto the stack.
    descended: bool,
}

pub struct InOrder<'a> {
    tree: &'a mut BTree,
    stack: Vec<Frame>,
    failed: bool,
}

impl BTree {
    /// Begin an in-order traversal from the current root. An empty
    /// tree yields no items.
    pub fn iter(&mut self) -> InOrder<'_> {
        let mut stack = Vec::new();
        if self.root_id() != 0 {
            if let Ok(root) = self.fetch(self.root_id()) {
                stack.push(Frame {
                    node: root,
                    idx: 0,
                    descended: false,
                });
            }
        }
        InOrder {
            tree: self,
            stack,
            failed: false,
        }
    }

    /// Collect the traversal into a `Vec`, surfacing the first error
    /// encountered (a corrupt block, for example).
    pub fn collect_pairs(&mut self) -> Result<Vec<(u64, u64)>, EngineError> {
        let mut out = Vec::new();
        let mut iter = self.iter();
        while let Some(item) = iter.try_next()? {
            out.push(item);
        }
        Ok(out)
    }
}

impl<'a> InOrder<'a> {
    /// Fallible single step, used by [`BTree::collect_pairs`] so a
    /// corrupt block aborts the walk instead of silently truncating
    /// it.
    pub fn try_next(&mut self) -> Result<Option<(u64, u64)>, EngineError> {
        if self.failed {
            return Ok(None);
        }
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if !frame.descended {
                frame.descended = true;
                let child_id = frame.node.children[frame.idx];
                if child_id != 0 {
                    let child = match self.tree.fetch(child_id) {
                        Ok(n) => n,
                        Err(e) => {
                            self.failed = true;
                            return Err(e);
                        }
                    };
                    self.stack.push(Frame {
                        node: child,
                        idx: 0,
                        descended: false,
                    });
                    continue;
                }
            }

            if frame.idx == frame.node.num_keys {
                self.stack.pop();
                continue;
            }

            let key = frame.node.keys[frame.idx];
            let value = frame.node.values[frame.idx];
            frame.idx += 1;
            frame.descended = false;
            return Ok(Some((key, value)));
        }
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().unwrap_or_else(|_| None)
    }
}
