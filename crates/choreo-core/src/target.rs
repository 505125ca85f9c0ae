#![forbid(unsafe_code)]

//! Elements and animation targets.
//!
//! # Design
//!
//! [`Element`] is a shared handle to one UI-tree node (`Rc<..>` interior;
//! cloning shares the node). Identity is the monotonic [`ElementId`], stable
//! for the life of the node — two handles compare equal iff they point at the
//! same node, regardless of attribute state.
//!
//! [`Target`] makes the "animate my own element" placeholder a tagged sum:
//! a call either names an explicit element or says "the element my
//! controller owns", and resolution is an explicit structural transform in
//! the runtime rather than a sentinel-value rewrite.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;

use crate::value::Value;

/// Stable, process-unique element identity.
pub type ElementId = u64;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

struct ElementInner {
    id: ElementId,
    tag: String,
    attrs: RefCell<AHashMap<String, Value>>,
}

/// A shared handle to one UI-tree node.
///
/// The attribute map is what engines write animated values into; it stands
/// in for whatever the host tree renders from.
///
/// # Invariants
///
/// 1. `id()` never changes for a given node.
/// 2. Clones share the node: an attribute written through one handle is
///    visible through every clone.
/// 3. Equality is identity, not attribute equality.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    /// Create a fresh node with the given tag and no attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed),
                tag: tag.into(),
                attrs: RefCell::new(AHashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Current value of one attribute, cloned out.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.inner.attrs.borrow().get(name).cloned()
    }

    /// Write one attribute. Engines call this when a playback step lands.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .attrs
            .borrow_mut()
            .insert(name.into(), value.into());
    }

    /// Snapshot of all attributes.
    #[must_use]
    pub fn attrs(&self) -> AHashMap<String, Value> {
        self.inner.attrs.borrow().clone()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .field("tag", &self.inner.tag)
            .field("attr_count", &self.inner.attrs.borrow().len())
            .finish()
    }
}

/// Who an animation call animates.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// The element the issuing controller owns. Must be resolved to an
    /// [`Element`] before the call reaches an engine.
    Owned,
    /// An explicit element, passed through resolution untouched.
    Element(Element),
}

impl Target {
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self, Target::Owned)
    }
}

impl From<Element> for Target {
    fn from(e: Element) -> Self {
        Target::Element(e)
    }
}
