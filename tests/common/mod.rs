#![allow(dead_code)]

pub mod agents;
pub mod fixtures;
pub mod stores;

pub use agents::*;
pub use fixtures::*;
pub use stores::*;
