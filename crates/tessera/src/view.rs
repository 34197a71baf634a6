//! Render-time view trees.
//!
//! A [`BlockView`] mirrors one [`Block`](crate::Block) at render time. It
//! carries the variables templates read and the views of the block's
//! children. Views are cheap handles: cloning a `BlockView` yields another
//! handle to the same node.

use std::{
    cell::{Cell, Ref, RefCell, RefMut},
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;

use tessera_core::{Map, Value};

struct ViewNode {
    parent: Weak<ViewNode>,
    vars: RefCell<Map>,
    children: RefCell<IndexMap<String, BlockView>>,
    rendered: Cell<bool>,
}

/// A node of the view tree.
#[derive(Clone)]
pub struct BlockView(Rc<ViewNode>);

impl BlockView {
    /// Creates an empty view below `parent`.
    ///
    /// The new view is not registered as a child of `parent`; use
    /// [`BlockView::add_child`] for that.
    pub fn new(parent: Option<&BlockView>) -> Self {
        Self(Rc::new(ViewNode {
            parent: parent.map_or_else(Weak::new, |parent| Rc::downgrade(&parent.0)),
            vars: RefCell::new(Map::new()),
            children: RefCell::new(IndexMap::new()),
            rendered: Cell::new(false),
        }))
    }

    pub fn parent(&self) -> Option<BlockView> {
        self.0.parent.upgrade().map(BlockView)
    }

    pub fn is_root(&self) -> bool {
        self.0.parent.upgrade().is_none()
    }

    /// Borrows the view variables.
    ///
    /// # Panics
    ///
    /// Panics if the variables are currently borrowed mutably.
    pub fn vars(&self) -> Ref<'_, Map> {
        self.0.vars.borrow()
    }

    /// Mutably borrows the view variables.
    pub fn vars_mut(&self) -> RefMut<'_, Map> {
        self.0.vars.borrow_mut()
    }

    /// Returns a copy of the variable `name`.
    pub fn var(&self, name: &str) -> Option<Value> {
        self.0.vars.borrow().get(name).cloned()
    }

    pub fn set_var(&self, name: &str, value: impl Into<Value>) {
        self.0.vars.borrow_mut().insert(name.to_owned(), value.into());
    }

    /// Attaches `child` under `name`, replacing any previous child of that name.
    pub fn add_child(&self, name: &str, child: BlockView) {
        self.0.children.borrow_mut().insert(name.to_owned(), child);
    }

    pub fn remove_child(&self, name: &str) -> Option<BlockView> {
        self.0.children.borrow_mut().shift_remove(name)
    }

    pub fn child(&self, name: &str) -> Option<BlockView> {
        self.0.children.borrow().get(name).cloned()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.0.children.borrow().contains_key(name)
    }

    /// Returns the child views in insertion order.
    pub fn children(&self) -> Vec<BlockView> {
        self.0.children.borrow().values().cloned().collect()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.0.children.borrow().keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// Returns whether the view has been rendered.
    ///
    /// A view with children counts as rendered once all of its children
    /// are; the derived state is remembered. A view without children is only
    /// rendered once marked explicitly.
    pub fn is_rendered(&self) -> bool {
        if self.0.rendered.get() {
            return true;
        }

        let children = self.0.children.borrow();
        if children.is_empty() || !children.values().all(BlockView::is_rendered) {
            return false;
        }
        self.0.rendered.set(true);
        true
    }

    /// Marks the view as rendered.
    pub fn set_rendered(&self) -> &Self {
        self.0.rendered.set(true);
        self
    }

    /// Returns whether both handles point to the same view.
    pub fn ptr_eq(&self, other: &BlockView) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BlockView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockView")
            .field("vars", &*self.0.vars.borrow())
            .field("children", &self.child_names())
            .field("rendered", &self.0.rendered.get())
            .finish()
    }
}
