//! Compiling mapping scripts into command trees

use super::report::CompilationReport;
use super::script::MappingScript;
use crate::command::{
    ChainError, CommandContext, CommandTree, CommandTreeFactory, NodeId, Side,
};
use crate::config::compile_time::registry::MAX_COMMANDS_PER_MAPPING;
use crate::config::runtime::{GrammarPreferences, ResolutionPreferences};
use crate::execution::{CollectionsComparisonType, ExecutionContext};
use crate::grammar::{IdentifierRegistry, TokenizedChain};
use crate::introspection::{TypeIntrospector, TypeRef};
use crate::logging::codes;
use crate::{log_error, log_success, log_warning};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// A resolved chain and its leaf node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainDescriptor {
    pub chain: TokenizedChain,
    pub leaf: NodeId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledCommand {
    pub id: String,
    pub source: Option<ChainDescriptor>,
    pub target: ChainDescriptor,
    pub converter: Option<String>,
    /// `None` for target-only commands
    pub collection_size_type: Option<CollectionsComparisonType>,
    pub generated_type: String,
}

/// A fully compiled mapping. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledMapping {
    pub id: String,
    pub namespace: String,
    pub source_tree: CommandTree,
    pub target_tree: CommandTree,
    pub commands: Vec<CompiledCommand>,
}

impl CompiledMapping {
    pub fn tree(&self, side: Side) -> &CommandTree {
        match side {
            Side::Source => &self.source_tree,
            Side::Target => &self.target_tree,
        }
    }

    /// Draw one generated type name per command from `identifiers`, in
    /// command order
    pub fn assign_generated_types(&mut self, identifiers: &mut IdentifierRegistry) {
        let prefix = format!("{}.{}", self.namespace, self.id);
        for command in &mut self.commands {
            command.generated_type = identifiers.synthesize(&prefix, &command.target.chain.chain);
        }
    }

    pub fn command(&self, id: &str) -> Option<&CompiledCommand> {
        self.commands.iter().find(|c| c.id == id)
    }

    /// Every chain of one side in command order
    pub fn chains(&self, side: Side) -> impl Iterator<Item = &TokenizedChain> {
        self.commands.iter().filter_map(move |c| match side {
            Side::Source => c.source.as_ref().map(|d| &d.chain),
            Side::Target => Some(&c.target.chain),
        })
    }

    /// Context positioned at a chain's first node
    pub fn first_context<'a>(
        &'a self,
        side: Side,
        chain: &'a TokenizedChain,
    ) -> Option<CommandContext<'a>> {
        CommandContext::at_first(self.tree(side), chain)
    }

    pub fn execution_context<'a>(
        &'a self,
        command: &'a CompiledCommand,
    ) -> Option<ExecutionContext<'a>> {
        let source = self.first_context(Side::Source, &command.source.as_ref()?.chain)?;
        let target = self.first_context(Side::Target, &command.target.chain)?;
        Some(ExecutionContext::new(source, target))
    }
}

/// Result of compiling one script. `mapping` is present only when every
/// chain compiled.
#[derive(Debug)]
pub struct CompilationOutcome {
    pub mapping: Option<CompiledMapping>,
    pub reports: Vec<CompilationReport>,
}

impl CompilationOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &CompilationReport> {
        self.reports.iter().filter(|r| !r.success)
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.mapping.is_some()
    }
}

/// Compiles scripts against one introspector, sharing the identifier
/// registry so generated names stay unique across scripts.
pub struct MappingCompiler<'a> {
    introspector: &'a dyn TypeIntrospector,
    grammar: GrammarPreferences,
    resolution: ResolutionPreferences,
    identifiers: IdentifierRegistry,
}

impl<'a> MappingCompiler<'a> {
    pub fn new(introspector: &'a dyn TypeIntrospector) -> Self {
        Self {
            introspector,
            grammar: GrammarPreferences::default(),
            resolution: ResolutionPreferences::default(),
            identifiers: IdentifierRegistry::new(),
        }
    }

    pub fn with_preferences(
        mut self,
        grammar: GrammarPreferences,
        resolution: ResolutionPreferences,
    ) -> Self {
        self.grammar = grammar;
        self.resolution = resolution;
        self
    }

    pub fn compile(&mut self, script: &MappingScript) -> CompilationOutcome {
        compile_script(
            script,
            self.introspector,
            &mut self.identifiers,
            &self.grammar,
            &self.resolution,
        )
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Compile every command of `script`, collecting a report per failing chain
/// instead of stopping at the first one.
pub fn compile_script(
    script: &MappingScript,
    introspector: &dyn TypeIntrospector,
    identifiers: &mut IdentifierRegistry,
    grammar: &GrammarPreferences,
    resolution: &ResolutionPreferences,
) -> CompilationOutcome {
    let mut reports = Vec::new();
    let fail = |reports: Vec<CompilationReport>| CompilationOutcome {
        mapping: None,
        reports,
    };

    if grammar.strict_identifiers {
        let invalid = std::iter::once(script.id.as_str())
            .chain(script.commands.iter().map(|c| c.id.as_str()))
            .find(|id| !is_identifier(id));
        if let Some(id) = invalid {
            reports.push(CompilationReport::failure(
                &script.id,
                codes::file_processing::INVALID_SCRIPT,
                &format!("'{}' is not a valid identifier", id),
            ));
            return fail(reports);
        }
    }

    if script.commands.len() > MAX_COMMANDS_PER_MAPPING {
        reports.push(CompilationReport::failure(
            &script.id,
            codes::registry::LIMIT_EXCEEDED,
            &format!(
                "{} commands exceed the limit of {}",
                script.commands.len(),
                MAX_COMMANDS_PER_MAPPING
            ),
        ));
        return fail(reports);
    }

    let root_types: Result<(TypeRef, TypeRef), _> = introspector
        .type_ref(&script.source_type)
        .and_then(|s| introspector.type_ref(&script.target_type).map(|t| (s, t)));
    let (source_type, target_type) = match root_types {
        Ok(types) => types,
        Err(e) => {
            reports.push(CompilationReport::failure(&script.id, e.error_code(), &e.to_string()));
            return fail(reports);
        }
    };

    let overrides = |side: Side| -> IndexMap<String, String> {
        script
            .overrides_for(side)
            .map(|o| (o.token_path.clone(), o.concrete_type.clone()))
            .collect()
    };
    let mut source_tree =
        CommandTree::new(Side::Source, source_type).with_overrides(overrides(Side::Source));
    let mut target_tree =
        CommandTree::new(Side::Target, target_type).with_overrides(overrides(Side::Target));

    let factory =
        CommandTreeFactory::new(introspector).with_preferences(resolution.clone());
    let namespace = script
        .namespace
        .clone()
        .unwrap_or_else(|| grammar.default_namespace.clone());

    let mut seen_ids = HashSet::new();
    let mut resolved = Vec::with_capacity(script.commands.len());

    for command in &script.commands {
        if !seen_ids.insert(command.id.as_str()) {
            reports.push(
                CompilationReport::failure(
                    &script.id,
                    codes::registry::DUPLICATE_COMMAND,
                    &format!("command '{}' is declared more than once", command.id),
                )
                .with_command(&command.id),
            );
            continue;
        }

        let mut failed = false;
        let mut record = |side: Side, chain: &str, error: ChainError| {
            log_error!(error.error_code(), "Chain failed to compile",
                "mapping" => script.id,
                "command" => command.id,
                "side" => side.as_str(),
                "chain" => chain,
                "error" => error
            );
            reports.push(CompilationReport::chain_failure(
                &script.id,
                &command.id,
                side,
                chain,
                &error,
            ));
        };

        let source = match &command.from {
            Some(chain) => match factory.resolve_str(&mut source_tree, chain) {
                Ok((tokens, leaf)) => Some(ChainDescriptor { chain: tokens, leaf }),
                Err(e) => {
                    record(Side::Source, chain, e);
                    failed = true;
                    None
                }
            },
            None => None,
        };
        let target = match factory.resolve_str(&mut target_tree, &command.to) {
            Ok((tokens, leaf)) => Some(ChainDescriptor { chain: tokens, leaf }),
            Err(e) => {
                record(Side::Target, &command.to, e);
                failed = true;
                None
            }
        };

        if failed {
            if !resolution.continue_after_chain_error {
                break;
            }
            continue;
        }
        if let Some(target) = target {
            resolved.push((command, source, target));
        }
    }

    let failures = reports.iter().filter(|r| !r.success).count();
    if failures > 0 {
        log_warning!("Mapping not compiled",
            "mapping" => script.id,
            "failures" => failures
        );
        return fail(reports);
    }

    let commands = resolved
        .into_iter()
        .map(|(command, source, target)| {
            let collection_size_type = source.as_ref().and_then(|s| {
                let source_ctx = CommandContext::at_first(&source_tree, &s.chain)?;
                let target_ctx = CommandContext::at_first(&target_tree, &target.chain)?;
                Some(ExecutionContext::new(source_ctx, target_ctx).collection_size_type())
            });
            CompiledCommand {
                id: command.id.clone(),
                generated_type: String::new(),
                source,
                target,
                converter: command.converter.clone(),
                collection_size_type,
            }
        })
        .collect::<Vec<_>>();

    log_success!(codes::success::MAPPING_COMPILED, "Mapping compiled",
        "mapping" => script.id,
        "commands" => commands.len(),
        "source_nodes" => source_tree.len(),
        "target_nodes" => target_tree.len()
    );
    reports.push(CompilationReport::success(
        &script.id,
        &format!("compiled {} command(s)", commands.len()),
    ));

    let mut mapping = CompiledMapping {
        id: script.id.clone(),
        namespace,
        source_tree,
        target_tree,
        commands,
    };
    mapping.assign_generated_types(identifiers);
    CompilationOutcome {
        mapping: Some(mapping),
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::SchemaRegistry;

    pub(crate) const SCHEMA: &str = r#"
        [types.Customer.fields]
        name = "String"
        orders = "List<Order>"
        tags = "Map<String, Int>"

        [types.Order.fields]
        items = "List<Item>"

        [types.Item.fields]
        sku = "String"

        [types.Account.fields]
        title = "String"
        codes = "List<String>"
        labels = "Map<String, Int>"
        status = "String"
    "#;

    fn script(commands: &str) -> MappingScript {
        MappingScript::from_toml_str(&format!(
            "id = \"customer_to_account\"\nsource_type = \"Customer\"\ntarget_type = \"Account\"\nnamespace = \"crm\"\n{}",
            commands
        ))
        .unwrap()
    }

    fn compile(script: &MappingScript) -> CompilationOutcome {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let mut compiler = MappingCompiler::new(&schema);
        compiler.compile(script)
    }

    #[test]
    fn test_compile_valid_script() {
        let outcome = compile(&script(
            r#"
            [[commands]]
            id = "title"
            from = "name"
            to = "title"

            [[commands]]
            id = "codes"
            from = "orders[*].items[*].sku"
            to = "codes[*]"

            [[commands]]
            id = "labels_keys"
            from = "tags<K>"
            to = "labels<K>"

            [[commands]]
            id = "status"
            to = "status"
            converter = "constant_active"
            "#,
        ));

        assert!(outcome.is_success());
        let mapping = outcome.mapping.unwrap();
        assert_eq!(mapping.commands.len(), 4);
        assert_eq!(mapping.namespace, "crm");

        let codes = mapping.command("codes").unwrap();
        assert_eq!(
            codes.collection_size_type,
            Some(CollectionsComparisonType::LargeSource)
        );
        assert_eq!(codes.generated_type, "CrmCustomerToAccountCodes");

        let title = mapping.command("title").unwrap();
        assert_eq!(title.collection_size_type, Some(CollectionsComparisonType::EqualSize));

        assert_eq!(mapping.command("status").unwrap().collection_size_type, None);
        assert_eq!(mapping.chains(Side::Source).count(), 3);
        assert_eq!(mapping.chains(Side::Target).count(), 4);
        assert!(mapping.execution_context(codes).is_some());
    }

    #[test]
    fn test_all_chain_failures_are_reported() {
        let outcome = compile(&script(
            r#"
            [[commands]]
            id = "bad_map"
            from = "tags"
            to = "title"

            [[commands]]
            id = "bad_syntax"
            from = "orders[*.items"
            to = "title"

            [[commands]]
            id = "good"
            from = "name"
            to = "status"

            [[commands]]
            id = "bad_target"
            from = "name"
            to = "ghost"
            "#,
        ));

        assert!(!outcome.is_success());
        let codes: Vec<_> = outcome
            .failures()
            .filter_map(|r| r.code.as_deref())
            .collect();
        assert_eq!(codes, vec!["E201", "E101", "E302"]);

        let target_failure = outcome
            .failures()
            .find(|r| r.command_id.as_deref() == Some("bad_target"))
            .unwrap();
        assert_eq!(target_failure.side, Some(Side::Target));
        assert_eq!(target_failure.chain.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_duplicate_command_ids() {
        let outcome = compile(&script(
            r#"
            [[commands]]
            id = "a"
            from = "name"
            to = "title"

            [[commands]]
            id = "a"
            from = "name"
            to = "status"
            "#,
        ));

        assert!(!outcome.is_success());
        assert_eq!(outcome.failures().next().unwrap().code.as_deref(), Some("E402"));
    }

    #[test]
    fn test_stop_after_first_failure_when_configured() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let resolution = ResolutionPreferences {
            continue_after_chain_error: false,
            log_node_creation: false,
        };
        let mut compiler = MappingCompiler::new(&schema)
            .with_preferences(GrammarPreferences::default(), resolution);

        let outcome = compiler.compile(&script(
            r#"
            [[commands]]
            id = "one"
            from = "ghost"
            to = "title"

            [[commands]]
            id = "two"
            from = "phantom"
            to = "title"
            "#,
        ));

        assert_eq!(outcome.failure_count(), 1);
    }

    #[test]
    fn test_invalid_identifiers_are_rejected() {
        let outcome = compile(&script(
            r#"
            [[commands]]
            id = "not-an-id"
            from = "name"
            to = "title"
            "#,
        ));
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_count(), 1);
    }

    #[test]
    fn test_unknown_root_type() {
        let mut broken = script("");
        broken.source_type = "Ghost".to_string();
        let outcome = compile(&broken);
        assert_eq!(outcome.failures().next().unwrap().code.as_deref(), Some("E301"));
    }

    #[test]
    fn test_generated_names_are_unique_across_scripts() {
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let mut compiler = MappingCompiler::new(&schema);
        let body = "[[commands]]\nid = \"t\"\nfrom = \"name\"\nto = \"title\"\n";

        let first = compiler.compile(&script(body)).mapping.unwrap();
        let mut other = script(body);
        other.id = "customer_to_account_".to_string();
        let second = compiler.compile(&other).mapping.unwrap();

        assert_eq!(first.commands[0].generated_type, "CrmCustomerToAccountTitle");
        assert_eq!(second.commands[0].generated_type, "CrmCustomerToAccountTitle_2");
    }
}
