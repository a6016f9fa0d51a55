//! Syntax-tree model for manual-page documents.
//!
//! A parsed manual is a rooted ordered tree of typed nodes
//! ([`NodeKind`]: root, block, head/body/tail regions, inline elements,
//! text leaves), each tagged with its macro identity ([`Mac`]), source
//! position, flag set, and the named section it appears in. The tree is
//! an arena ([`Tree`]) addressed by [`NodeId`] indices; ownership flows
//! through first-child/next-sibling links and the whole document frees
//! in one drop.
//!
//! Alongside the tree live the closed vocabularies the parser dispatches
//! over: the structured-dialect macros ([`MdocMacro`]), the
//! presentation-dialect macros ([`ManMacro`]), and the argument flags
//! ([`ArgFlag`]) with their shared bundles ([`ArgList`]).
//!
//! # Construction discipline
//!
//! Handlers build the tree through a cursor plus a relation hint
//! ([`Relation`]): every insertion lands at the cursor and becomes the
//! new cursor. Mutations preserve the structural invariants (region
//! ordering, leaf text nodes, legal parents); debug builds assert them
//! after each operation and [`Tree::check_consistency`] verifies the
//! whole tree in tests.

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod args;
mod macros;
mod node;
mod tree;

pub use args::{Arg, ArgBundle, ArgFlag, ArgList};
pub use macros::{Mac, ManMacro, MdocMacro};
pub use node::{Meta, Msec, Node, NodeFlags, NodeId, NodeKind, Section, Volume};
pub use tree::{Children, InsertPoint, Relation, Tree};
