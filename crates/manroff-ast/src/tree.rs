//! The document tree arena and its builder operations.
//!
//! Nodes live in one growable arena owned by [`Tree`]; links are indices,
//! so there is no shared mutable pointer graph and the whole document is
//! freed in one drop. Ownership flows through `first_child`/`next`;
//! `parent`/`prev` are non-owning back-pointers kept consistent by the
//! mutation operations below.
//!
//! Construction follows a cursor + relation-hint discipline: each newly
//! created node is inserted at the current cursor according to the hint
//! and becomes the new cursor. A handler that emits a constructed
//! sub-tree and returns to its caller's context saves and restores the
//! insertion point.

use crate::args::ArgBundle;
use crate::macros::Mac;
use crate::node::{Meta, Node, NodeId, NodeKind, Section};

/// How the next node relates to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Insert as the cursor's last child.
    Child,
    /// Insert immediately after the cursor.
    Sibling,
}

/// Saved insertion point; see [`Tree::save_point`].
#[derive(Debug, Clone, Copy)]
pub struct InsertPoint {
    cursor: NodeId,
    relation: Relation,
}

/// A rooted ordered document tree.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    cursor: NodeId,
    relation: Relation,
    /// Document metadata, populated by prologue validation.
    pub meta: Meta,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree holding only its root.
    pub fn new() -> Self {
        let root = Node::new(NodeKind::Root, None, 0, 0);
        Tree {
            nodes: vec![root],
            root: NodeId(0),
            cursor: NodeId(0),
            relation: Relation::Child,
            meta: Meta::default(),
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Shared access to a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Exclusive access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Current insertion cursor.
    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Move the cursor.
    pub fn set_cursor(&mut self, id: NodeId) {
        self.cursor = id;
    }

    /// Current relation hint.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Set the relation hint for the next insertion.
    pub fn set_relation(&mut self, relation: Relation) {
        self.relation = relation;
    }

    /// Capture the insertion point for later [`Tree::restore_point`].
    pub fn save_point(&self) -> InsertPoint {
        InsertPoint { cursor: self.cursor, relation: self.relation }
    }

    /// Return to a captured insertion point.
    pub fn restore_point(&mut self, point: InsertPoint) {
        self.cursor = point.cursor;
        self.relation = point.relation;
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a macro node and insert it at the cursor.
    pub fn push(
        &mut self,
        kind: NodeKind,
        mac: Mac,
        line: usize,
        col: usize,
        sec: Section,
    ) -> NodeId {
        debug_assert!(!matches!(kind, NodeKind::Root | NodeKind::Text));
        let mut node = Node::new(kind, Some(mac), line, col);
        node.sec = sec;
        let id = self.alloc(node);
        self.insert_at_cursor(id);
        id
    }

    /// Create a text leaf and insert it at the cursor.
    ///
    /// Text nodes carry a non-empty decoded string.
    pub fn push_text(&mut self, text: String, line: usize, col: usize, sec: Section) -> NodeId {
        debug_assert!(!text.is_empty());
        let mut node = Node::new(NodeKind::Text, None, line, col);
        node.text = Some(text);
        node.sec = sec;
        let id = self.alloc(node);
        self.insert_at_cursor(id);
        id
    }

    /// Attach an argument bundle to a node.
    pub fn set_args(&mut self, id: NodeId, args: ArgBundle) {
        self.node_mut(id).args = Some(args);
    }

    fn insert_at_cursor(&mut self, id: NodeId) {
        match self.relation {
            Relation::Child => self.append_child(self.cursor, id),
            Relation::Sibling => self.append_after(self.cursor, id),
        }
        self.cursor = id;
        self.relation = Relation::Child;
        #[cfg(debug_assertions)]
        self.debug_check_local(id);
    }

    /// Append a detached node as `parent`'s last child.
    pub fn append_child(&mut self, parent: NodeId, id: NodeId) {
        debug_assert!(self.node(id).parent.is_none());
        let last = self.node(parent).last_child;
        {
            let node = self.node_mut(id);
            node.parent = Some(parent);
            node.prev = last;
            node.next = None;
        }
        match last {
            Some(last) => self.node_mut(last).next = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        let parent_node = self.node_mut(parent);
        parent_node.last_child = Some(id);
        parent_node.nchild += 1;
    }

    /// Append a detached node immediately after `after`.
    pub fn append_after(&mut self, after: NodeId, id: NodeId) {
        debug_assert!(self.node(id).parent.is_none());
        let parent = self.node(after).parent;
        debug_assert!(parent.is_some(), "cannot append a sibling to the root");
        let next = self.node(after).next;
        {
            let node = self.node_mut(id);
            node.parent = parent;
            node.prev = Some(after);
            node.next = next;
        }
        self.node_mut(after).next = Some(id);
        match next {
            Some(next) => self.node_mut(next).prev = Some(id),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = Some(id);
                }
            }
        }
        if let Some(parent) = parent {
            self.node_mut(parent).nchild += 1;
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev;
                }
            }
        }
        if let Some(parent) = parent {
            self.node_mut(parent).nchild -= 1;
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Remove a node, lifting its children into its place.
    pub fn splice_out(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        let parent = self.node(id).parent;
        let mut anchor = id;
        for child in children {
            // Detach from the spliced node first, then re-insert.
            let node = self.node_mut(child);
            node.parent = None;
            node.prev = None;
            node.next = None;
            if parent.is_some() {
                self.append_after(anchor, child);
            }
            anchor = child;
        }
        let node = self.node_mut(id);
        node.first_child = None;
        node.last_child = None;
        node.nchild = 0;
        self.unlink(id);
        #[cfg(debug_assertions)]
        if let Some(parent) = parent {
            self.debug_check_local(parent);
        }
    }

    /// Detach a whole subtree from the document.
    ///
    /// The nodes stay in the arena but become unreachable; the arena is
    /// reclaimed wholesale when the tree drops. The cursor is moved to
    /// the detached node's parent if it pointed inside the subtree.
    pub fn free_subtree(&mut self, id: NodeId) {
        let parent = self.node(id).parent;
        if self.is_ancestor_or_self(id, self.cursor) {
            self.cursor = parent.unwrap_or(self.root);
            self.relation = Relation::Child;
        }
        self.unlink(id);
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.node(id).parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children { tree: self, next: self.node(id).first_child }
    }

    /// First child of `id` with the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id).find(|&c| self.node(c).kind == kind)
    }

    /// The `Head` region of a block.
    pub fn head_of(&self, block: NodeId) -> Option<NodeId> {
        self.child_of_kind(block, NodeKind::Head)
    }

    /// The `Body` region of a block.
    pub fn body_of(&self, block: NodeId) -> Option<NodeId> {
        self.child_of_kind(block, NodeKind::Body)
    }

    /// The `Tail` region of a block.
    pub fn tail_of(&self, block: NodeId) -> Option<NodeId> {
        self.child_of_kind(block, NodeKind::Tail)
    }

    /// Concatenated text of all `Text` leaves under `id`, space-joined.
    pub fn collect_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text_into(id, &mut out);
        out
    }

    fn collect_text_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if node.kind == NodeKind::Text {
            if let Some(text) = &node.text {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(text);
            }
        }
        let mut child = node.first_child;
        while let Some(c) = child {
            self.collect_text_into(c, out);
            child = self.node(c).next;
        }
    }

    /// Number of live (reachable) nodes, root included.
    pub fn live_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            count += 1;
            let mut child = self.node(id).first_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.node(c).next;
            }
        }
        count
    }

    /// Verify full link consistency of the reachable tree.
    ///
    /// Checks the §3 structural invariants: mutual parent/child/sibling
    /// consistency, child counts, region ordering (Head before Body
    /// before Tail), leaf-ness of text nodes, and region parent kinds.
    /// Used by debug assertions and tests; cost is linear in tree size.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut seen = vec![false; self.nodes.len()];
        self.check_node(self.root, None, &mut seen)
    }

    fn check_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        seen: &mut [bool],
    ) -> Result<(), String> {
        if seen[id.index()] {
            return Err(format!("node {} reached twice", id.index()));
        }
        seen[id.index()] = true;

        let node = self.node(id);
        if node.parent != parent {
            return Err(format!("node {} has wrong parent link", id.index()));
        }
        match node.kind {
            NodeKind::Text => {
                if node.first_child.is_some() {
                    return Err(format!("text node {} has children", id.index()));
                }
                if node.text.as_deref().is_none_or(str::is_empty) {
                    return Err(format!("text node {} has no string", id.index()));
                }
            }
            NodeKind::Head | NodeKind::Body | NodeKind::Tail => {
                let pkind = parent.map(|p| self.node(p).kind);
                if pkind != Some(NodeKind::Block) {
                    return Err(format!("region node {} outside a block", id.index()));
                }
            }
            NodeKind::Elem => {
                let pkind = parent.map(|p| self.node(p).kind);
                if !matches!(
                    pkind,
                    Some(NodeKind::Head | NodeKind::Body | NodeKind::Tail)
                ) {
                    return Err(format!("elem node {} under illegal parent", id.index()));
                }
            }
            _ => {}
        }

        let mut count = 0;
        let mut prev: Option<NodeId> = None;
        let mut region_rank = 0u8;
        let mut child = node.first_child;
        while let Some(c) = child {
            count += 1;
            if self.node(c).prev != prev {
                return Err(format!("node {} has wrong prev link", c.index()));
            }
            let rank = match self.node(c).kind {
                NodeKind::Head => 1,
                NodeKind::Body => 2,
                NodeKind::Tail => 3,
                _ => 0,
            };
            if rank != 0 {
                if rank < region_rank {
                    return Err(format!("regions out of order under {}", id.index()));
                }
                region_rank = rank;
            }
            self.check_node(c, Some(id), seen)?;
            prev = Some(c);
            child = self.node(c).next;
        }
        if prev != node.last_child {
            return Err(format!("node {} has wrong last_child link", id.index()));
        }
        if count != node.nchild {
            return Err(format!("node {} child count mismatch", id.index()));
        }
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn debug_check_local(&self, id: NodeId) {
        let node = self.node(id);
        if let Some(parent) = node.parent {
            let ok = self.children(parent).any(|c| c == id);
            debug_assert!(ok, "node missing from its parent's child chain");
        }
        if let Some(prev) = node.prev {
            debug_assert_eq!(self.node(prev).next, Some(id));
        }
        if let Some(next) = node.next {
            debug_assert_eq!(self.node(next).prev, Some(id));
        }
    }
}

/// Iterator over one node's children.
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.node(id).next;
        Some(id)
    }
}
