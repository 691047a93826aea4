pub mod hash_map;
pub mod hasher;
pub mod heap;

use std::hash::BuildHasherDefault;
use indexmap::IndexSet;
use rustc_hash::FxHasher;

pub use hash_map::{ChainedHashMap, MapConfig};
pub use hasher::{CyclicShiftHasher, MadCompression};
pub use heap::{AdaptablePriorityQueue, Locator};


/// Use indexmap for insertion-ordered sets and rustc_hash for fast hashing
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;
