//! Ordered key-value containers sharing one insert/search/delete/range
//! contract, for comparing balancing and indexing strategies side by side.
#![warn(missing_docs)]

mod avl_tree;
mod bplus_tree;
mod bst;
mod btree_iter;
mod btree_map;
mod btree_node;
pub mod config;
mod container;
pub mod error;
mod hash_table;
pub mod key;
mod rb_tree;
mod skip_list;
mod sorted_array;

pub use avl_tree::AvlTree;
pub use bplus_tree::BPlusTree;
pub use bst::Bst;
pub use btree_iter::Iter as BTreeIter;
pub use btree_map::BTree;
pub use config::{ContainerConfig, HashTableConfig, SkipListConfig};
pub use container::{ContainerKind, OrderedContainer};
pub use error::{ContainerError, Result};
pub use hash_table::HashTable;
pub use rb_tree::RbTree;
pub use skip_list::SkipList;
pub use sorted_array::SortedArray;
