//! Textual chain sanitization and generated identifier synthesis

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn map_bracket() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[^\[\],]*,[^\[\],]*\]").expect("static pattern"))
}

fn collection_bracket() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[^\[\],]*\]").expect("static pattern"))
}

fn decoration() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)|\^").expect("static pattern"))
}

/// Registry-key form of a chain: `[a,b]` becomes `[*,*]`, any other bracket
/// body becomes `[*]`, and anchors are dropped.
///
/// ```
/// use otc_compiler::grammar::sanitize;
/// assert_eq!(sanitize("orders[^*].lines[3].tags[k,v]<K>"), "orders[*].lines[*].tags[*,*]<K>");
/// ```
pub fn sanitize(chain: &str) -> String {
    let maps = map_bracket().replace_all(chain, "[*,*]");
    collection_bracket()
        .replace_all(&maps, "[*]")
        .replace('^', "")
}

/// Identifier fragment for a chain: notation stripped, `<K>`/`<V>` spelled
/// out, and every segment or `_`-separated word capitalized.
pub fn identifier_fragment(chain: &str) -> String {
    let stripped = decoration()
        .replace_all(chain, "")
        .replace("<K>", ".key")
        .replace("<V>", ".value");

    let mut out = String::with_capacity(stripped.len());
    let mut upper_next = true;
    for ch in stripped.chars() {
        match ch {
            '.' | '_' => upper_next = true,
            c if upper_next => {
                out.extend(c.to_uppercase());
                upper_next = false;
            }
            c => out.push(c),
        }
    }
    out
}

/// Hands out generated type names. Identical sanitized chains share a name;
/// distinct chains that would collide get a numeric suffix.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    by_chain: HashMap<String, String>,
    taken: HashSet<String>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synthesize(&mut self, namespace: &str, chain: &str) -> String {
        let key = format!("{}::{}", namespace, sanitize(chain));
        if let Some(existing) = self.by_chain.get(&key) {
            return existing.clone();
        }

        let base = format!(
            "{}{}",
            identifier_fragment(namespace),
            identifier_fragment(chain)
        );
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        self.taken.insert(candidate.clone());
        self.by_chain.insert(key, candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_brackets_and_anchors() {
        assert_eq!(sanitize("orders[0].items[*^].sku"), "orders[*].items[*].sku");
        assert_eq!(sanitize("tags[a, b]<V>.label"), "tags[*,*]<V>.label");
        assert_eq!(sanitize("a[^]"), "a[*]");
        assert_eq!(sanitize("plain.path"), "plain.path");
    }

    #[test]
    fn test_identifier_fragment() {
        assert_eq!(identifier_fragment("orders[*].line_items[^*].sku"), "OrdersLineItemsSku");
        assert_eq!(identifier_fragment("tags<K>"), "TagsKey");
        assert_eq!(identifier_fragment("payload(com.acme.Card).amount"), "PayloadAmount");
        assert_eq!(identifier_fragment("order_mapping"), "OrderMapping");
    }

    #[test]
    fn test_registry_shares_identical_chains() {
        let mut registry = IdentifierRegistry::new();
        let first = registry.synthesize("order_mapping", "orders[0].sku");
        let second = registry.synthesize("order_mapping", "orders[*].sku");
        assert_eq!(first, "OrderMappingOrdersSku");
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_suffixes_collisions() {
        let mut registry = IdentifierRegistry::new();
        let key_side = registry.synthesize("m", "tags<K>");
        let field = registry.synthesize("m", "tags.key");
        let snake = registry.synthesize("m", "tags_key");

        assert_eq!(key_side, "MTagsKey");
        assert_eq!(field, "MTagsKey_2");
        assert_eq!(snake, "MTagsKey_3");
    }
}
