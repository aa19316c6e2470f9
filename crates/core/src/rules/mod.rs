//! Field rule engine.
//!
//! Maps a field descriptor to the pipeline fragment that migrates it. Rules
//! form an explicit list ordered by priority (highest first). Each rule may
//! decline, produce a fragment and let later rules run, or produce a
//! fragment and halt the chain. The last fragment produced before the chain
//! halts (or runs out) wins.
//!
//! Built-in order:
//!
//! | priority | rule |
//! |---|---|
//! | 90 | revision key |
//! | 85 | uuid key |
//! | 80 | identity key |
//! | 70 | hierarchical self-reference |
//! | 60 | entity reference |
//! | 50 | entity reference revisions |
//! | 40 | navigation link parent |
//! | 30 | asset storage path |
//! | 20 | image / file attachment |
//! | -100 | default copy |

mod default;
mod keys;
mod reference;
mod special;

use staging_schema::{EntityTypeDescriptor, FieldDescriptor, StagingScope};

use crate::step::{LanguageVariant, Pipeline};

pub use default::DefaultRule;
pub use keys::{IdentityKeyRule, RevisionKeyRule, UuidKeyRule};
pub use reference::{EntityReferenceRule, HierarchyRule, ReferenceRevisionsRule};
pub use special::{AssetUriRule, AttachmentRule, NavigationParentRule};

pub const PRIORITY_REVISION: i32 = 90;
pub const PRIORITY_UUID: i32 = 85;
pub const PRIORITY_IDENTITY: i32 = 80;
pub const PRIORITY_HIERARCHY: i32 = 70;
pub const PRIORITY_REFERENCE: i32 = 60;
pub const PRIORITY_REFERENCE_REVISIONS: i32 = 50;
pub const PRIORITY_NAVIGATION_PARENT: i32 = 40;
pub const PRIORITY_ASSET_URI: i32 = 30;
pub const PRIORITY_ATTACHMENT: i32 = 20;
pub const PRIORITY_DEFAULT: i32 = -100;

/// Everything a rule may look at besides the field itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub scope: StagingScope<'a>,
    pub entity_type: &'a EntityTypeDescriptor,
    pub bundle: &'a str,
    pub variant: LanguageVariant,
}

/// What a rule decided for one field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleOutcome {
    pub fragment: Option<Pipeline>,
    pub halt: bool,
}

impl RuleOutcome {
    /// Not my field; ask the next rule.
    pub fn decline() -> Self {
        Self::default()
    }

    /// Final answer.
    pub fn halt_with(fragment: Pipeline) -> Self {
        RuleOutcome {
            fragment: Some(fragment),
            halt: true,
        }
    }

    /// Final answer: the field is not migrated at all.
    pub fn halt_empty() -> Self {
        RuleOutcome {
            fragment: None,
            halt: true,
        }
    }

    /// Tentative answer that a later rule may replace.
    pub fn proceed_with(fragment: Pipeline) -> Self {
        RuleOutcome {
            fragment: Some(fragment),
            halt: false,
        }
    }
}

/// A field rule handler.
pub trait FieldRule {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Higher runs first. Rules of equal priority keep registration order.
    fn priority(&self) -> i32;

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome;
}

/// Ordered rule chain.
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn FieldRule>>,
}

impl RuleEngine {
    /// An engine with no rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An engine with every built-in rule registered.
    pub fn with_builtin_rules() -> Self {
        let mut engine = Self::empty();
        engine.register(Box::new(RevisionKeyRule));
        engine.register(Box::new(UuidKeyRule));
        engine.register(Box::new(IdentityKeyRule));
        engine.register(Box::new(HierarchyRule));
        engine.register(Box::new(EntityReferenceRule));
        engine.register(Box::new(ReferenceRevisionsRule));
        engine.register(Box::new(NavigationParentRule));
        engine.register(Box::new(AssetUriRule));
        engine.register(Box::new(AttachmentRule));
        engine.register(Box::new(DefaultRule));
        engine
    }

    /// Insert a rule at its priority.
    pub fn register(&mut self, rule: Box<dyn FieldRule>) {
        let at = self
            .rules
            .iter()
            .position(|r| r.priority() < rule.priority())
            .unwrap_or(self.rules.len());
        self.rules.insert(at, rule);
    }

    /// Rule names in execution order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run the chain for one field. `None` means the field is not migrated.
    pub fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> Option<Pipeline> {
        let mut result = None;
        for rule in &self.rules {
            let outcome = rule.resolve(ctx, field);
            if outcome.fragment.is_some() {
                result = outcome.fragment;
            }
            if outcome.halt {
                tracing::debug!(
                    entity_type = %ctx.entity_type.id,
                    bundle = ctx.bundle,
                    field = %field.name,
                    rule = rule.name(),
                    "rule chain halted"
                );
                break;
            }
        }
        result
    }
}
