use crate::facts::Fact;
use crate::surface::{NodeError, NodeId, NodeView, Surface};
use crate::vnode::VNode;

/// Reads an existing real subtree back into a virtual tree, so markup that
/// was produced elsewhere can serve as the first `old` tree for [`diff`].
///
/// Only attributes and inline styles are recovered; properties and
/// listeners are not observable. Nodes that are neither text nor elements
/// become empty text.
///
/// [`diff`]: crate::diff
pub fn virtualize<M>(surface: &dyn Surface, node: NodeId) -> Result<VNode<M>, NodeError> {
    match surface.describe(node)? {
        NodeView::Text(text) => Ok(VNode::text(text)),
        NodeView::Other => Ok(VNode::text("")),
        NodeView::Element {
            tag,
            namespace,
            attributes,
            namespaced_attributes,
            styles,
        } => {
            let mut facts = Vec::with_capacity(
                attributes.len() + namespaced_attributes.len() + styles.len(),
            );
            facts.extend(
                attributes
                    .into_iter()
                    .map(|(name, value)| Fact::Attribute { name, value }),
            );
            facts.extend(namespaced_attributes.into_iter().map(|attribute| {
                Fact::AttributeNs {
                    namespace: attribute.namespace,
                    name: attribute.name,
                    value: attribute.value,
                }
            }));
            facts.extend(
                styles
                    .into_iter()
                    .map(|(name, value)| Fact::Style { name, value }),
            );

            let children = surface
                .children(node)?
                .into_iter()
                .map(|child| virtualize(surface, child))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(match namespace {
                Some(namespace) => VNode::element_ns(&namespace, &tag, facts, children),
                None => VNode::element(&tag, facts, children),
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/virtualize_tests.rs"]
mod tests;
