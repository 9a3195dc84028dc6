//! B-Tree Engine — search, insert, split-child, and root management
//! over a [`FileStore`] and [`PageCache`] pair.

use crate::db::btree::cache::PageCache;
use crate::db::btree::codec::{Node, MAX_CHILDREN, MAX_KEYS, MIN_KEYS};
use crate::db::btree::store::FileStore;
use crate::error::EngineError;
use crate::{info, warn};
use std::path::Path;

pub struct BTree {
    store: FileStore,
    cache: PageCache,
}

impl BTree {
    /// Create a fresh index file. `overwrite` controls whether an
    /// existing file at `path` is clobbered; the decision of whether
    /// to prompt the user belongs to the CLI shell, not here.
    pub fn create(
        path: impl AsRef<Path>,
        magic: &str,
        cache_capacity: usize,
        overwrite: bool,
    ) -> Result<Self, EngineError> {
        let store = FileStore::create(path, magic, overwrite)?;
        info!(format!("created index file '{}'", store.path().display()));
        Ok(Self {
            store,
            cache: PageCache::new(cache_capacity),
        })
    }

    /// Open an existing index file, verifying its magic tag.
    pub fn open(path: impl AsRef<Path>, magic: &str, cache_capacity: usize) -> Result<Self, EngineError> {
        let store = FileStore::open(path, magic)?;
        info!(format!("opened index file '{}'", store.path().display()));
        Ok(Self {
            store,
            cache: PageCache::new(cache_capacity),
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn root_id(&self) -> u64 {
        self.store.root()
    }

    pub fn is_empty(&self) -> bool {
        self.store.root() == 0
    }

    fn read_node(&mut self, block_id: u64) -> Result<Node, EngineError> {
        if let Some(node) = self.cache.get(block_id) {
            return Ok(node.clone());
        }
        let node = self.store.read_block(block_id)?;
        self.cache.put(node.clone());
        Ok(node)
    }

    fn write_node(&mut self, node: &Node) -> Result<(), EngineError> {
        self.store.write_block(node)?;
        self.cache.put(node.clone());
        Ok(())
    }

    /// Search for `key`. Returns the value on a hit; `NotFound` is a
    /// normal outcome, not an operational failure.
    pub fn search(&mut self, key: u64) -> Result<u64, EngineError> {
        let root_id = self.store.root();
        if root_id == 0 {
            warn!(format!("search miss: key {} not found (empty tree)", key));
            return Err(EngineError::NotFound(key));
        }
        self.search_node(root_id, key)
    }

    fn search_node(&mut self, block_id: u64, key: u64) -> Result<u64, EngineError> {
        let node = self.read_node(block_id)?;
        for i in 0..node.num_keys {
            if key == node.keys[i] {
                return Ok(node.values[i]);
            }
            if key < node.keys[i] {
                let child = node.children[i];
                if child == 0 {
                    warn!(format!("search miss: key {} not found", key));
                    return Err(EngineError::NotFound(key));
                }
                return self.search_node(child, key);
            }
        }
        let child = node.children[node.num_keys];
        if child == 0 {
            warn!(format!("search miss: key {} not found", key));
            return Err(EngineError::NotFound(key));
        }
        self.search_node(child, key)
    }

    /// Insert `(key, value)`. Fails with `DuplicateKey` if the key is
    /// already present.
    pub fn insert(&mut self, key: u64, value: u64) -> Result<(), EngineError> {
        if self.store.root() == 0 {
            let id = self.store.allocate_block_id()?;
            let mut root = Node::new(id, 0);
            root.keys[0] = key;
            root.values[0] = value;
            root.num_keys = 1;
            self.write_node(&root)?;
            self.store.write_root(id)?;
            info!(format!("inserted key {} as first entry in new root {}", key, id));
            return Ok(());
        }

        match self.search(key) {
            Ok(_) => return Err(EngineError::DuplicateKey(key)),
            Err(EngineError::NotFound(_)) => {}
            Err(other) => return Err(other),
        }

        let root_id = self.store.root();
        let root = self.read_node(root_id)?;
        if root.is_full() {
            self.split_root(key, value)?;
        } else {
            self.insert_non_full(root_id, key, value)?;
        }
        info!(format!("inserted key {}", key));
        Ok(())
    }

    fn split_root(&mut self, key: u64, value: u64) -> Result<(), EngineError> {
        let old_root_id = self.store.root();
        let mut old_root = self.read_node(old_root_id)?;
        let new_root_id = self.store.allocate_block_id()?;

        old_root.parent_id = new_root_id;
        let mut new_root = Node::new(new_root_id, 0);
        new_root.children[0] = old_root_id;

        self.split_child(&mut new_root, 0, &mut old_root)?;
        self.store.write_root(new_root_id)?;
        warn!(format!(
            "root {} was full; split into new root {}",
            old_root_id, new_root_id
        ));

        let descend_id = if key > new_root.keys[0] {
            new_root.children[1]
        } else {
            new_root.children[0]
        };
        self.insert_non_full(descend_id, key, value)
    }

    fn insert_non_full(&mut self, node_id: u64, key: u64, value: u64) -> Result<(), EngineError> {
        let mut node = self.read_node(node_id)?;

        if node.is_leaf() {
            let mut pos = node.num_keys;
            while pos > 0 && node.keys[pos - 1] > key {
                node.keys[pos] = node.keys[pos - 1];
                node.values[pos] = node.values[pos - 1];
                pos -= 1;
            }
            node.keys[pos] = key;
            node.values[pos] = value;
            node.num_keys += 1;
            return self.write_node(&node);
        }

        let mut i = node.num_keys;
        for idx in 0..node.num_keys {
            if key < node.keys[idx] {
                i = idx;
                break;
            }
        }

        let child_id = node.children[i];
        let mut child = self.read_node(child_id)?;

        if child.is_full() {
            self.split_child(&mut node, i, &mut child)?;
            if key > node.keys[i] {
                i += 1;
            }
            let descend_id = node.children[i];
            return self.insert_non_full(descend_id, key, value);
        }

        self.insert_non_full(child_id, key, value)
    }

    /// Split `child` (the full node at `parent.children[index]`) in
    /// two, promoting the median key/value into `parent` at
    /// `index`. Persists the new sibling, the shrunk child, and the
    /// updated parent before returning.
    fn split_child(&mut self, parent: &mut Node, index: usize, child: &mut Node) -> Result<(), EngineError> {
        let sibling_id = self.store.allocate_block_id()?;
        let mid = MIN_KEYS;
        let mut sibling = Node::new(sibling_id, parent.block_id);

        for i in (mid + 1)..MAX_KEYS {
            sibling.keys[i - (mid + 1)] = child.keys[i];
            sibling.values[i - (mid + 1)] = child.values[i];
        }
        let was_internal = !child.is_leaf();
        if was_internal {
            for i in (mid + 1)..MAX_CHILDREN {
                sibling.children[i - (mid + 1)] = child.children[i];
            }
        }
        sibling.num_keys = MAX_KEYS - (mid + 1);

        let promoted_key = child.keys[mid];
        let promoted_value = child.values[mid];

        for i in mid..MAX_KEYS {
            child.keys[i] = 0;
            child.values[i] = 0;
        }
        if was_internal {
            for i in (mid + 1)..MAX_CHILDREN {
                child.children[i] = 0;
            }
        }
        child.num_keys = mid;

        for i in (index..parent.num_keys).rev() {
            parent.keys[i + 1] = parent.keys[i];
            parent.values[i + 1] = parent.values[i];
        }
        for j in (index + 1..=parent.num_keys).rev() {
            parent.children[j + 1] = parent.children[j];
        }
        parent.keys[index] = promoted_key;
        parent.values[index] = promoted_value;
        parent.children[index + 1] = sibling_id;
        parent.num_keys += 1;

        self.write_node(&sibling)?;
        self.write_node(child)?;
        self.write_node(parent)?;

        Ok(())
    }

    pub(crate) fn fetch(&mut self, block_id: u64) -> Result<Node, EngineError> {
        self.read_node(block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_tree(dir: &std::path::Path) -> BTree {
        BTree::create(dir.join("idx"), "4337PRJ3", 3, false).unwrap()
    }

    #[test]
    fn search_on_empty_tree_is_not_found() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        assert!(matches!(tree.search(10), Err(EngineError::NotFound(10))));
    }

    #[test]
    fn single_insert_then_search() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(10, 100).unwrap();
        assert_eq!(tree.root_id(), 1);
        assert_eq!(tree.search(10).unwrap(), 100);
    }

    #[test]
    fn duplicate_key_is_rejected_and_keeps_first_value() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        tree.insert(10, 100).unwrap();
        let err = tree.insert(10, 200).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateKey(10)));
        assert_eq!(tree.search(10).unwrap(), 100);
    }

    #[test]
    fn root_split_after_twenty_inserts() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        for k in 1..=19u64 {
            tree.insert(k, k * 10).unwrap();
        }
        let root = tree.fetch(tree.root_id()).unwrap();
        assert_eq!(root.num_keys, 19);

        tree.insert(20, 200).unwrap();
        assert_eq!(tree.root_id(), 2);

        let new_root = tree.fetch(2).unwrap();
        assert_eq!(new_root.num_keys, 1);
        assert_eq!(new_root.keys[0], 10);
        assert_eq!(new_root.children[0], 1);
        assert_eq!(new_root.children[1], 3);

        let left = tree.fetch(1).unwrap();
        assert_eq!(left.num_keys, 9);
        for (idx, &k) in (1..=9u64).enumerate() {
            assert_eq!(left.keys[idx], k);
        }

        let right = tree.fetch(3).unwrap();
        assert_eq!(right.num_keys, 10);
        let expected: Vec<u64> = (11..=20).collect();
        for (idx, &k) in expected.iter().enumerate() {
            assert_eq!(right.keys[idx], k);
        }

        for k in 1..=20u64 {
            assert_eq!(tree.search(k).unwrap(), k * 10);
        }
    }

    #[test]
    fn many_inserts_are_all_searchable() {
        let dir = tempdir().unwrap();
        let mut tree = open_tree(dir.path());
        for k in 0..500u64 {
            tree.insert(k, k * 2).unwrap();
        }
        for k in 0..500u64 {
            assert_eq!(tree.search(k).unwrap(), k * 2);
        }
        assert!(matches!(tree.search(99999), Err(EngineError::NotFound(99999))));
    }
}
