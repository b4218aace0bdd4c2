use core::fmt;
use std::sync::Arc;

use crate::info::access::FieldAccess;
use crate::info::{ViewContext, ViewContexts};
use crate::value::ChangeSet;

/// Lookup key for a wire name. Matching is case-insensitive by default.
#[inline]
pub(crate) fn normalize(wire_name: &str) -> String {
    wire_name.to_lowercase()
}

// -----------------------------------------------------------------------------
// FieldDescriptor

/// Wire-level metadata of one declared field.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    wire_name: &'static str,
    key: String,
    type_path: &'static str,
    contexts: ViewContexts,
    always: ViewContexts,
    context_names: Vec<(ViewContext, &'static str)>,
    omit_null: bool,
    proxy: Option<&'static str>,
    access: Arc<dyn FieldAccess>,
}

impl FieldDescriptor {
    pub(crate) fn new(
        name: &'static str,
        type_path: &'static str,
        access: Arc<dyn FieldAccess>,
    ) -> Self {
        Self {
            name,
            wire_name: name,
            key: normalize(name),
            type_path,
            contexts: ViewContexts::empty(),
            always: ViewContexts::empty(),
            context_names: Vec::new(),
            omit_null: false,
            proxy: None,
            access,
        }
    }

    /// The logical (Rust) field name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The property name used when no context-specific name applies.
    #[inline]
    pub fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// Property name to emit under `context`.
    pub fn wire_name_for(&self, context: ViewContext) -> &'static str {
        self.context_names
            .iter()
            .find_map(|(ctx, name)| (*ctx == context).then_some(*name))
            .unwrap_or(self.wire_name)
    }

    /// Normalized wire name, the descriptor's lookup key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Rust type path of the declared field type.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Contexts the field participates in. Empty declarations mean `DEFAULT`.
    #[inline]
    pub fn contexts(&self) -> ViewContexts {
        if self.contexts.is_empty() {
            ViewContexts::DEFAULT
        } else {
            self.contexts
        }
    }

    /// Whether the field appears at all under `context`.
    ///
    /// `always` and context-specific names opt the field into their own
    /// context on top of the declared ones.
    pub fn participates_in(&self, context: ViewContext) -> bool {
        self.contexts().includes(context)
            || self.always.includes(context)
            || self.context_names.iter().any(|(ctx, _)| *ctx == context)
    }

    /// Contexts in which the field is emitted even when unchanged.
    #[inline]
    pub fn always(&self) -> ViewContexts {
        self.always
    }

    #[inline]
    pub fn omits_null(&self) -> bool {
        self.omit_null
    }

    /// Name of the envelope property for proxied collections.
    #[inline]
    pub fn proxy(&self) -> Option<&'static str> {
        self.proxy
    }

    /// Decides whether the field is emitted under `context`.
    ///
    /// For changed-only contexts a field also needs to be `always` there or be
    /// named, logically or by wire name, in `changes`. Objects without a change
    /// set treat every field as changed.
    pub fn is_eligible(&self, context: ViewContext, changes: Option<&ChangeSet>) -> bool {
        if !self.participates_in(context) {
            return false;
        }
        if !context.is_changed_only() || self.always.includes(context) {
            return true;
        }
        changes.is_none_or(|changes| {
            changes.contains(self.name)
                || changes.contains(self.wire_name)
                || changes.contains(self.wire_name_for(context))
        })
    }

    #[inline]
    pub(crate) fn access(&self) -> &dyn FieldAccess {
        &*self.access
    }

    pub(crate) fn access_arc(&self) -> Arc<dyn FieldAccess> {
        Arc::clone(&self.access)
    }

    pub(crate) fn with_access(&self, access: Arc<dyn FieldAccess>) -> Self {
        Self {
            access,
            ..self.clone()
        }
    }

    pub(crate) fn set_wire_name(&mut self, wire_name: &'static str) {
        self.wire_name = wire_name;
        self.key = normalize(wire_name);
    }

    pub(crate) fn add_context(&mut self, context: ViewContext) {
        self.contexts |= context.flag();
    }

    pub(crate) fn add_always(&mut self, context: ViewContext) {
        self.always |= context.flag();
    }

    pub(crate) fn set_context_name(&mut self, context: ViewContext, wire_name: &'static str) {
        self.context_names.retain(|(ctx, _)| *ctx != context);
        self.context_names.push((context, wire_name));
    }

    pub(crate) fn set_omit_null(&mut self) {
        self.omit_null = true;
    }

    pub(crate) fn set_proxy(&mut self, property: &'static str) {
        self.proxy = Some(property);
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("type_path", &self.type_path)
            .field("contexts", &self.contexts())
            .field("always", &self.always)
            .field("omit_null", &self.omit_null)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}
