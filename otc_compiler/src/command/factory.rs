//! Command tree factory
//!
//! Resolves tokenized chains into [`CommandTree`] nodes, reusing every node
//! an earlier chain already created. Only newly created nodes consult the
//! [`TypeIntrospector`]; resolving a chain whose nodes all exist performs no
//! introspection unless a type hint has to be compared by its resolved name.

use super::error::{ChainError, ChainResult, SemanticsError};
use super::node::{CollectionDescriptor, CommandNode, NodeId};
use super::tree::CommandTree;
use crate::config::runtime::ResolutionPreferences;
use crate::grammar::notation::COLLECTION_NOTATION;
use crate::grammar::{tokenize, ChainToken, MapSide, SyntaxError, TokenizedChain};
use crate::introspection::{
    FieldDescriptor, TypeIntrospector, TypeKind, TypeRef, TypeResolutionError,
};
use crate::log_debug;
use indexmap::IndexMap;

pub struct CommandTreeFactory<'a> {
    introspector: &'a dyn TypeIntrospector,
    preferences: ResolutionPreferences,
}

impl<'a> CommandTreeFactory<'a> {
    pub fn new(introspector: &'a dyn TypeIntrospector) -> Self {
        Self {
            introspector,
            preferences: ResolutionPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: ResolutionPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Tokenize and resolve `chain`
    pub fn resolve_str(
        &self,
        tree: &mut CommandTree,
        chain: &str,
    ) -> ChainResult<(TokenizedChain, NodeId)> {
        let tokenized = tokenize(chain)?;
        let leaf = self.resolve(tree, &tokenized)?;
        Ok((tokenized, leaf))
    }

    /// Resolve `chain` and return its leaf node. When the last token is a
    /// container the leaf is its member (the addressed side for maps).
    ///
    /// A failing chain leaves the tree exactly as it was.
    pub fn resolve(&self, tree: &mut CommandTree, chain: &TokenizedChain) -> ChainResult<NodeId> {
        let anchors = chain.anchor_count();
        if anchors > 1 {
            return Err(SemanticsError::MultipleAnchors {
                chain: chain.chain.clone(),
                count: anchors,
            }
            .into());
        }

        let mark = tree.len();
        let result = self.resolve_tokens(tree, chain);
        match &result {
            Ok(_) if tree.len() > mark => {
                log_debug!("Resolved chain",
                    "chain" => chain.chain,
                    "side" => tree.side().as_str(),
                    "new_nodes" => tree.len() - mark
                );
            }
            Ok(_) => {}
            Err(_) => tree.rollback(mark),
        }
        result
    }

    fn resolve_tokens(&self, tree: &mut CommandTree, chain: &TokenizedChain) -> ChainResult<NodeId> {
        let mut current: Option<NodeId> = None;

        for token in &chain.tokens {
            let (node_id, cached) = match tree.child_of(current, &token.field_name) {
                Some(existing) => {
                    check_notation(tree.node(existing).descriptor, chain, token)?;
                    (existing, true)
                }
                None => (self.create_node(tree, current, chain, token)?, false),
            };
            // plain nodes have no member and stay current
            let typed = tree.member_of(node_id, token.map_side).unwrap_or(node_id);
            if cached {
                self.check_type_hint(tree, typed, chain, token)?;
            }
            current = Some(typed);
        }

        current.ok_or_else(|| SyntaxError::empty_segment(&chain.chain, 0).into())
    }

    fn create_node(
        &self,
        tree: &mut CommandTree,
        parent: Option<NodeId>,
        chain: &TokenizedChain,
        token: &ChainToken,
    ) -> ChainResult<NodeId> {
        let owner = self.owner_type(tree, parent, chain, token)?;
        let field = self
            .introspector
            .field_type(&owner.name, &token.field_name)
            .map_err(|e| ChainError::type_resolution(&chain.chain, e))?;

        let descriptor = CollectionDescriptor::from_kind(field.declared_type.kind);
        check_notation(descriptor, chain, token)?;

        let path = match parent {
            Some(p) => format!("{}.{}", tree.node(p).path, token.field_name),
            None => token.field_name.clone(),
        };
        let concrete_type = if descriptor.is_container() {
            None
        } else {
            self.concrete_type_for(
                tree,
                chain,
                &path,
                token.type_hint.as_deref(),
                &field.declared_type,
            )?
        };

        let node = CommandNode {
            id: 0,
            token_index: token.index,
            token: String::new(),
            path,
            declared_type: field.declared_type.clone(),
            field,
            descriptor,
            concrete_type,
            is_first_node: parent.is_none(),
            side: tree.side(),
            parent: None,
            children: descriptor.is_container().then(IndexMap::new),
        };
        let id = tree
            .insert(parent, &token.field_name, node)
            .map_err(|e| ChainError::type_resolution(&chain.chain, e))?;

        if descriptor.is_collection() {
            self.create_collection_member(tree, id, chain, token)?;
        } else if descriptor.is_map() {
            self.create_map_member(tree, id, chain, token)?;
        }

        if self.preferences.log_node_creation {
            let created = tree.node(id);
            log_debug!("Created command node",
                "path" => created.path,
                "descriptor" => created.descriptor.as_str(),
                "type" => created.effective_type()
            );
        }

        Ok(id)
    }

    /// Synthesize the single element child of a list, set, queue or array.
    pub fn create_collection_member(
        &self,
        tree: &mut CommandTree,
        container: NodeId,
        chain: &TokenizedChain,
        token: &ChainToken,
    ) -> ChainResult<NodeId> {
        let (field, path) = {
            let node = tree.node(container);
            (node.field.clone(), format!("{}{}", node.path, COLLECTION_NOTATION))
        };

        let element = self.introspector.generic_arguments(&field).into_iter().next();
        let (declared_type, concrete_type) = self.member_types(
            tree,
            chain,
            &path,
            token.type_hint.as_deref(),
            element,
            &field,
        )?;

        let member = member_node(
            tree,
            token,
            path,
            &field,
            CollectionDescriptor::CollectionMember,
            declared_type,
            concrete_type,
        );
        tree.insert(Some(container), &field.name, member)
            .map_err(|e| ChainError::type_resolution(&chain.chain, e))
    }

    /// Synthesize the key and value children of a map. Returns
    /// `(key_member, value_member)`.
    pub fn create_map_member(
        &self,
        tree: &mut CommandTree,
        map: NodeId,
        chain: &TokenizedChain,
        token: &ChainToken,
    ) -> ChainResult<(NodeId, NodeId)> {
        let (field, base) = {
            let node = tree.node(map);
            (node.field.clone(), node.path.clone())
        };
        let args = self.introspector.generic_arguments(&field);

        let mut created = Vec::with_capacity(2);
        for (side, descriptor, element) in [
            (MapSide::Key, CollectionDescriptor::MapKey, args.first().cloned()),
            (MapSide::Value, CollectionDescriptor::MapValue, args.get(1).cloned()),
        ] {
            let path = format!("{}{}", base, side.marker());
            let hint = if token.map_side == Some(side) {
                token.type_hint.as_deref()
            } else {
                None
            };
            let (declared_type, concrete_type) =
                self.member_types(tree, chain, &path, hint, element, &field)?;

            let member = member_node(
                tree,
                token,
                path,
                &field,
                descriptor,
                declared_type,
                concrete_type,
            );
            let id = tree
                .insert(Some(map), &side.member_key(&field.name), member)
                .map_err(|e| ChainError::type_resolution(&chain.chain, e))?;
            created.push(id);
        }

        Ok((created[0], created[1]))
    }

    /// A reused node keeps the type it was created with. A hint naming a
    /// different type is an error rather than a silent retype.
    fn check_type_hint(
        &self,
        tree: &CommandTree,
        node: NodeId,
        chain: &TokenizedChain,
        token: &ChainToken,
    ) -> ChainResult<()> {
        let Some(hint) = token.type_hint.as_deref() else {
            return Ok(());
        };
        let resolved = &tree.node(node).effective_type().name;
        if hint == resolved {
            return Ok(());
        }
        let hinted = self
            .introspector
            .type_ref(hint)
            .map_err(|e| ChainError::type_resolution(&chain.chain, e))?;
        if &hinted.name == resolved {
            return Ok(());
        }
        Err(SemanticsError::ConflictingTypeHint {
            chain: chain.chain.clone(),
            field: token.field_name.clone(),
            hint: hint.to_string(),
            resolved: resolved.clone(),
            span: token.span,
        }
        .into())
    }

    /// Type whose fields the next token is looked up on
    fn owner_type(
        &self,
        tree: &CommandTree,
        parent: Option<NodeId>,
        chain: &TokenizedChain,
        token: &ChainToken,
    ) -> ChainResult<TypeRef> {
        let owner = match parent {
            Some(id) => tree.node(id).effective_type().clone(),
            None => tree.root_type().clone(),
        };

        match owner.kind {
            TypeKind::Object => Ok(owner),
            TypeKind::Abstract => self
                .introspector
                .concrete_type(&owner)
                .filter(|concrete| concrete.kind == TypeKind::Object)
                .ok_or_else(|| {
                    ChainError::type_resolution(
                        &chain.chain,
                        TypeResolutionError::UnresolvedAbstractType {
                            type_name: owner.name.clone(),
                            path: parent
                                .map(|id| tree.node(id).path.clone())
                                .unwrap_or_default(),
                        },
                    )
                }),
            TypeKind::Scalar => Err(ChainError::type_resolution(
                &chain.chain,
                TypeResolutionError::unknown_field(&owner.name, &token.field_name),
            )),
            _ => {
                let field = parent
                    .map(|id| tree.node(id).field.name.clone())
                    .unwrap_or_else(|| owner.name.clone());
                Err(SemanticsError::NestedContainer {
                    chain: chain.chain.clone(),
                    field,
                    span: token.span,
                }
                .into())
            }
        }
    }

    /// Concrete type for a node at `path`: inline hint, then script
    /// override, then the introspector's type-level mapping.
    fn concrete_type_for(
        &self,
        tree: &CommandTree,
        chain: &TokenizedChain,
        path: &str,
        hint: Option<&str>,
        declared: &TypeRef,
    ) -> ChainResult<Option<TypeRef>> {
        match hint.or_else(|| tree.override_for(path)) {
            Some(name) => self
                .introspector
                .type_ref(name)
                .map(Some)
                .map_err(|e| ChainError::type_resolution(&chain.chain, e)),
            None => Ok(self.introspector.concrete_type(declared)),
        }
    }

    /// Declared and concrete type of a container member. Raw containers
    /// need an explicit type for the member.
    fn member_types(
        &self,
        tree: &CommandTree,
        chain: &TokenizedChain,
        path: &str,
        hint: Option<&str>,
        element: Option<TypeRef>,
        field: &FieldDescriptor,
    ) -> ChainResult<(TypeRef, Option<TypeRef>)> {
        match element {
            Some(element) => {
                let concrete = self.concrete_type_for(tree, chain, path, hint, &element)?;
                Ok((element, concrete))
            }
            None => {
                let name = hint.or_else(|| tree.override_for(path)).ok_or_else(|| {
                    ChainError::type_resolution(
                        &chain.chain,
                        TypeResolutionError::RawCollection {
                            owner: field.owner.clone(),
                            field: field.name.clone(),
                            kind: field.declared_type.kind.as_str().to_string(),
                        },
                    )
                })?;
                let declared = self
                    .introspector
                    .type_ref(name)
                    .map_err(|e| ChainError::type_resolution(&chain.chain, e))?;
                Ok((declared, None))
            }
        }
    }
}

fn member_node(
    tree: &CommandTree,
    token: &ChainToken,
    path: String,
    field: &FieldDescriptor,
    descriptor: CollectionDescriptor,
    declared_type: TypeRef,
    concrete_type: Option<TypeRef>,
) -> CommandNode {
    CommandNode {
        id: 0,
        token_index: token.index,
        token: String::new(),
        path,
        field: field.clone(),
        descriptor,
        declared_type,
        concrete_type,
        is_first_node: false,
        side: tree.side(),
        parent: None,
        children: None,
    }
}

/// Check the token's notation against the kind of field it binds to
fn check_notation(
    descriptor: CollectionDescriptor,
    chain: &TokenizedChain,
    token: &ChainToken,
) -> Result<(), SemanticsError> {
    let chain_text = || chain.chain.clone();
    let field = || token.field_name.clone();

    if descriptor.is_collection() {
        if token.has_collection_notation {
            return Ok(());
        }
        if token.map_side.is_some() {
            return Err(SemanticsError::MarkerOnNonMap {
                chain: chain_text(),
                field: field(),
                span: token.span,
            });
        }
        return Err(SemanticsError::MissingCollectionNotation {
            chain: chain_text(),
            field: field(),
            kind: descriptor.as_str().to_lowercase(),
            span: token.span,
        });
    }

    if descriptor.is_map() {
        return match (token.map_side, token.anchor) {
            (None, _) => Err(SemanticsError::MissingKeyValueMarker {
                chain: chain_text(),
                field: field(),
                span: token.span,
            }),
            (Some(_), Some(_)) => Err(SemanticsError::AnchorOnNonCollection {
                chain: chain_text(),
                field: field(),
                span: token.span,
            }),
            (Some(_), None) => Ok(()),
        };
    }

    if token.anchor.is_some() {
        Err(SemanticsError::AnchorOnNonCollection {
            chain: chain_text(),
            field: field(),
            span: token.span,
        })
    } else if token.map_side.is_some() {
        Err(SemanticsError::MarkerOnNonMap {
            chain: chain_text(),
            field: field(),
            span: token.span,
        })
    } else if token.has_notation() {
        Err(SemanticsError::NotationOnPlainField {
            chain: chain_text(),
            field: field(),
            span: token.span,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Side;
    use crate::introspection::SchemaRegistry;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCHEMA: &str = r#"
        [types.Customer.fields]
        name = "String"
        orders = "List<Order>"
        tags = "Map<String, Int>"
        labels = "Map<String, Label>"
        payment = "Payment"
        legacy = "List"
        grid = "List<List<Int>>"
        history = "Order[]"

        [types.Order.fields]
        id = "String"
        items = "List<Item>"

        [types.Item.fields]
        sku = "String"

        [types.Label.fields]
        text = "String"

        [types.Payment]
        abstract = true

        [types.CardPayment.fields]
        number = "String"

        [types.WirePayment.fields]
        iban = "String"
    "#;

    /// Counts every introspection call
    struct CountingIntrospector {
        inner: SchemaRegistry,
        calls: AtomicUsize,
    }

    impl CountingIntrospector {
        fn new(inner: SchemaRegistry) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TypeIntrospector for CountingIntrospector {
        fn type_ref(&self, name: &str) -> crate::introspection::TypeResult<TypeRef> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.type_ref(name)
        }

        fn field_type(
            &self,
            owner: &str,
            field: &str,
        ) -> crate::introspection::TypeResult<FieldDescriptor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.field_type(owner, field)
        }

        fn generic_arguments(&self, field: &FieldDescriptor) -> Vec<TypeRef> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.generic_arguments(field)
        }

        fn concrete_type(&self, declared: &TypeRef) -> Option<TypeRef> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.concrete_type(declared)
        }
    }

    fn schema() -> SchemaRegistry {
        SchemaRegistry::from_toml_str(SCHEMA).unwrap()
    }

    fn tree() -> CommandTree {
        CommandTree::new(Side::Source, TypeRef::object("Customer"))
    }

    #[test]
    fn test_plain_chain_resolution() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        let (_, leaf) = factory.resolve_str(&mut tree, "name").unwrap();
        let node = tree.node(leaf);
        assert_eq!(node.descriptor, CollectionDescriptor::Normal);
        assert!(node.is_first_node);
        assert_eq!(node.declared_type, TypeRef::scalar("String"));
        assert_eq!(node.children, None);
    }

    #[test]
    fn test_repeat_resolution_is_idempotent_without_introspection() {
        let introspector = CountingIntrospector::new(schema());
        let factory = CommandTreeFactory::new(&introspector);
        let mut tree = tree();

        let (_, first) = factory
            .resolve_str(&mut tree, "orders[*].items[*].sku")
            .unwrap();
        let snapshot = tree.clone();
        let calls = introspector.calls();
        assert!(calls > 0);

        let (_, second) = factory
            .resolve_str(&mut tree, "orders[0].items[^].sku")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(tree, snapshot);
        assert_eq!(introspector.calls(), calls);
    }

    #[test]
    fn test_collection_member_singularity() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        factory.resolve_str(&mut tree, "orders[*].id").unwrap();
        factory.resolve_str(&mut tree, "orders[*].items[*].sku").unwrap();
        factory.resolve_str(&mut tree, "orders[2]").unwrap();

        let orders = tree.node(tree.first_node("orders").unwrap());
        assert_eq!(orders.descriptor, CollectionDescriptor::List);
        assert_eq!(orders.child_count(), 1);

        let member = tree.node(orders.child("orders").unwrap());
        assert_eq!(member.descriptor, CollectionDescriptor::CollectionMember);
        assert_eq!(member.declared_type, TypeRef::object("Order"));
        assert_eq!(member.path, "orders[*]");

        let children: Vec<&String> = member.children.as_ref().unwrap().keys().collect();
        assert_eq!(children, vec!["id", "items"]);
    }

    #[test]
    fn test_array_member_uses_component_type() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        let (_, leaf) = factory.resolve_str(&mut tree, "history[*].id").unwrap();
        let member = tree.node(tree.node(leaf).parent.unwrap());
        assert_eq!(member.declared_type, TypeRef::object("Order"));
        assert_eq!(
            tree.node(member.parent.unwrap()).descriptor,
            CollectionDescriptor::Array
        );
    }

    #[test]
    fn test_map_key_value_pairing() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        let (_, key) = factory.resolve_str(&mut tree, "tags<K>").unwrap();
        let (_, value) = factory.resolve_str(&mut tree, "tags<V>").unwrap();

        let tags = tree.node(tree.first_node("tags").unwrap());
        assert_eq!(tags.descriptor, CollectionDescriptor::Map);
        assert_eq!(tags.child_count(), 2);
        assert_eq!(tags.child("<K>tags"), Some(key));
        assert_eq!(tags.child("<V>tags"), Some(value));

        assert_eq!(tree.node(key).descriptor, CollectionDescriptor::MapKey);
        assert_eq!(tree.node(key).declared_type, TypeRef::scalar("String"));
        assert_eq!(tree.node(value).descriptor, CollectionDescriptor::MapValue);
        assert_eq!(tree.node(value).declared_type, TypeRef::scalar("Int"));
    }

    #[test]
    fn test_map_value_fields() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        let (_, leaf) = factory.resolve_str(&mut tree, "labels[a,b]<V>.text").unwrap();
        assert_eq!(tree.node(leaf).path, "labels<V>.text");
    }

    #[test]
    fn test_map_without_marker_is_rejected() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        for chain in ["tags", "tags[*]", "tags[*,*]"] {
            assert_matches!(
                factory.resolve_str(&mut tree, chain),
                Err(ChainError::Semantics(SemanticsError::MissingKeyValueMarker { .. }))
            );
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_notation_mismatches() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        assert_matches!(
            factory.resolve_str(&mut tree, "orders.id"),
            Err(ChainError::Semantics(SemanticsError::MissingCollectionNotation { .. }))
        );
        assert_matches!(
            factory.resolve_str(&mut tree, "name[*]"),
            Err(ChainError::Semantics(SemanticsError::NotationOnPlainField { .. }))
        );
        assert_matches!(
            factory.resolve_str(&mut tree, "name[^]"),
            Err(ChainError::Semantics(SemanticsError::AnchorOnNonCollection { .. }))
        );
        assert_matches!(
            factory.resolve_str(&mut tree, "tags[^,*]<K>"),
            Err(ChainError::Semantics(SemanticsError::AnchorOnNonCollection { .. }))
        );
        assert_matches!(
            factory.resolve_str(&mut tree, "orders<K>"),
            Err(ChainError::Semantics(SemanticsError::MarkerOnNonMap { .. }))
        );
        assert_matches!(
            factory.resolve_str(&mut tree, "orders[^].items[*^].sku"),
            Err(ChainError::Semantics(SemanticsError::MultipleAnchors { count: 2, .. }))
        );
    }

    #[test]
    fn test_cached_node_still_checks_notation() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        factory.resolve_str(&mut tree, "orders[*].id").unwrap();
        assert_matches!(
            factory.resolve_str(&mut tree, "orders.id"),
            Err(ChainError::Semantics(SemanticsError::MissingCollectionNotation { .. }))
        );
    }

    #[test]
    fn test_raw_collection_needs_override() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);

        let mut plain = tree();
        assert_matches!(
            factory.resolve_str(&mut plain, "legacy[*]"),
            Err(ChainError::TypeResolution { source: TypeResolutionError::RawCollection { .. }, .. })
        );

        let mut with_override = tree();
        with_override.add_override("legacy[*]", "Item");
        let (_, leaf) = factory
            .resolve_str(&mut with_override, "legacy[*].sku")
            .unwrap();
        assert_eq!(with_override.node(leaf).path, "legacy[*].sku");
    }

    #[test]
    fn test_abstract_fields_need_a_concrete_type() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);

        let mut unresolved = tree();
        factory.resolve_str(&mut unresolved, "payment").unwrap();
        assert_matches!(
            factory.resolve_str(&mut unresolved, "payment.number"),
            Err(ChainError::TypeResolution { source: TypeResolutionError::UnresolvedAbstractType { .. }, .. })
        );

        let mut overridden = tree();
        overridden.add_override("payment", "CardPayment");
        let (_, leaf) = factory
            .resolve_str(&mut overridden, "payment.number")
            .unwrap();
        let payment = overridden.node(overridden.node(leaf).parent.unwrap());
        assert_eq!(payment.declared_type.kind, TypeKind::Abstract);
        assert_eq!(payment.concrete_type, Some(TypeRef::object("CardPayment")));

        let mut hinted = tree();
        factory
            .resolve_str(&mut hinted, "payment(WirePayment).iban")
            .unwrap();
    }

    #[test]
    fn test_reused_node_rejects_a_different_hint() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);

        for (first, second) in [
            ("payment(CardPayment).number", "payment(WirePayment).iban"),
            ("payment(WirePayment).iban", "payment(CardPayment).number"),
        ] {
            let mut tree = tree();
            factory.resolve_str(&mut tree, first).unwrap();
            let before = tree.len();

            let error = factory.resolve_str(&mut tree, second).unwrap_err();
            assert_matches!(
                &error,
                ChainError::Semantics(SemanticsError::ConflictingTypeHint { field, .. }) if field == "payment"
            );
            assert_eq!(error.error_code().as_str(), "E208");
            assert_eq!(tree.len(), before);
        }

        let mut tree = tree();
        factory.resolve_str(&mut tree, "payment(CardPayment).number").unwrap();
        factory.resolve_str(&mut tree, "payment(CardPayment).number").unwrap();
        factory.resolve_str(&mut tree, "payment.number").unwrap();
    }

    #[test]
    fn test_nested_container_and_scalar_descent() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        factory.resolve_str(&mut tree, "grid[*]").unwrap();
        assert_matches!(
            factory.resolve_str(&mut tree, "grid[*].x"),
            Err(ChainError::Semantics(SemanticsError::NestedContainer { .. }))
        );
        assert_matches!(
            factory.resolve_str(&mut tree, "name.length"),
            Err(ChainError::TypeResolution { source: TypeResolutionError::UnknownField { .. }, .. })
        );
    }

    #[test]
    fn test_failed_chain_leaves_tree_untouched() {
        let schema = schema();
        let factory = CommandTreeFactory::new(&schema);
        let mut tree = tree();

        factory.resolve_str(&mut tree, "orders[*].id").unwrap();
        let before = tree.clone();

        assert!(factory.resolve_str(&mut tree, "orders[*].items[*].ghost").is_err());
        assert_eq!(tree, before);
    }
}
