//! Stub tree construction from a syntax tree.
//!
//! Both builders traverse with an explicit stack, never recursion: source
//! files can nest arbitrarily deep and the walk must not be limited by the
//! thread's stack. Both honor `skip_child_processing` the same way and
//! assign stub ids in identical pre-order, so a light parse and a full parse
//! of the same content produce byte-identical serialized trees.

use crate::registry::SerializerRegistry;
use stubscope_api::models::stub::{SourceRef, StubTree};
use stubscope_api::models::syntax::{LightNode, LightTree, SyntaxNode};
use stubscope_api::models::ids::StubId;
use stubscope_plugin::cap::LanguageStubCap;

pub struct DefaultStubBuilder;

impl DefaultStubBuilder {
    /// Builds the stub tree for one view root of a file. Nodes whose kind
    /// has no stub capability are transparent: skipped themselves, children
    /// attached to the nearest stubbed ancestor.
    pub fn build(
        cap: &dyn LanguageStubCap,
        root: &SyntaxNode,
        text: &str,
        registry: &SerializerRegistry,
    ) -> StubTree {
        let mut tree = StubTree::new();
        if cap.stub_kind(&root.kind).is_none() {
            // Not a stub-aware root; nothing to index for this view.
            return tree;
        }

        let mut stack: Vec<(&SyntaxNode, Option<StubId>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let stub_parent = match cap.stub_kind(&node.kind) {
                Some(kind_cap) => match registry.id_of(kind_cap.external_id()) {
                    Some(serializer) => Some(tree.push(
                        parent,
                        serializer,
                        kind_cap.payload_from_node(node, text),
                        Some(SourceRef {
                            kind: node.kind.clone(),
                            range: node.range,
                        }),
                    )),
                    None => {
                        // Builder/parser desynchronization: the kind opted in
                        // but its serializer never reached the registry. The
                        // file's index entry is compromised until re-indexed.
                        tracing::error!(
                            kind = %node.kind,
                            external_id = kind_cap.external_id(),
                            "stub requested for a kind with no registered serializer"
                        );
                        parent
                    }
                },
                None => parent,
            };

            for child in node.children.iter().rev() {
                if cap.skip_child_processing(&node.kind, &child.kind) {
                    continue;
                }
                stack.push((child, stub_parent));
            }
        }
        tree
    }
}

pub struct LightStubBuilder;

impl LightStubBuilder {
    /// Same contract as [`DefaultStubBuilder::build`], driven from the
    /// flyweight event list.
    pub fn build(
        cap: &dyn LanguageStubCap,
        light: &LightTree,
        text: &str,
        registry: &SerializerRegistry,
    ) -> StubTree {
        let mut tree = StubTree::new();
        let Some(root) = light.root() else {
            return tree;
        };
        if cap.stub_kind(light.kind(root)).is_none() {
            return tree;
        }

        let mut stack: Vec<(LightNode, Option<StubId>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let kind = light.kind(node);
            let stub_parent = match cap.stub_kind(kind) {
                Some(kind_cap) => match registry.id_of(kind_cap.external_id()) {
                    Some(serializer) => Some(tree.push(
                        parent,
                        serializer,
                        kind_cap.payload_from_light(light, node, text),
                        Some(SourceRef {
                            kind: kind.clone(),
                            range: light.range(node),
                        }),
                    )),
                    None => {
                        tracing::error!(
                            kind = %kind,
                            external_id = kind_cap.external_id(),
                            "stub requested for a kind with no registered serializer"
                        );
                        parent
                    }
                },
                None => parent,
            };

            for child in light.children(node).into_iter().rev() {
                if cap.skip_child_processing(kind, light.kind(child)) {
                    continue;
                }
                stack.push((child, stub_parent));
            }
        }
        tree
    }
}
