//! Derivation of LL(1) and LR(0) parsing tables from a context-free grammar.
//!
//! The two analyses are independent back ends over the same [`grammar::Grammar`]:
//!
//! - `FirstSets` -> `FollowSets` -> [`ll1`] conflict check and predictive table;
//! - [`lr0`] canonical collection -> [`parse_table`] action/goto table.

pub mod first_sets;
pub mod follow_sets;
pub mod grammar;
pub mod ll1;
pub mod lr0;
pub mod parse_table;
pub mod syntax;
pub mod types;

mod util;
