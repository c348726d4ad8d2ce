#![doc = r"Virtual tree reconciliation: render a declarative tree onto a mutable UI surface, diff successive trees and patch the surface in place."]

mod apply;
pub mod collections;
mod diff;
pub mod event;
pub mod facts;
pub mod html;
mod index;
mod keyed;
mod memory;
pub mod patch;
mod render;
pub mod sanitize;
pub mod surface;
mod virtualize;
pub mod vnode;

pub use diff::diff;
pub use event::{
    decode, CustomResponse, DecodeError, Decoder, Dispatcher, EventContext, Handler, HandlerKind,
    Mapper,
};
pub use facts::{diff_facts, Fact, Facts, FactsDiff, NsChange, NsValue};
pub use keyed::DUPLICATE_KEY_SUFFIX;
pub use memory::MemorySurface;
pub use patch::{count_patches, Move, Patch, PatchKind, Reorder, ReorderEntry};
pub use render::{VirtualDom, VirtualDomOptions};
pub use surface::{
    DispatchOutcome, EventSource, Listener, ListenerOptions, ListenerResponse,
    NamespacedAttribute, NodeError, NodeId, NodeView, Surface,
};
pub use virtualize::virtualize;
pub use vnode::{
    CacheArg, CachedNode, ElementNode, KeyedNode, MappedNode, VNode, VNodeKind, Widget,
    WidgetNode, WidgetPatch,
};
