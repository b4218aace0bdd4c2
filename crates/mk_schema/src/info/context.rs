use core::fmt;

use bitflags::bitflags;

// -----------------------------------------------------------------------------
// ViewContext

/// The purpose of an encoding pass.
///
/// Fields declare which contexts they appear in. A field that declares none
/// only appears in [`ViewContext::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewContext {
    /// A full representation, e.g. for `GET` responses.
    #[default]
    Default,
    /// Fields accepted when creating a resource.
    Create,
    /// A partial update; only changed fields are emitted.
    Patch,
}

impl ViewContext {
    pub const ALL: [ViewContext; 3] = [Self::Default, Self::Create, Self::Patch];

    #[inline]
    pub const fn flag(self) -> ViewContexts {
        match self {
            Self::Default => ViewContexts::DEFAULT,
            Self::Create => ViewContexts::CREATE,
            Self::Patch => ViewContexts::PATCH,
        }
    }

    /// Returns `true` for contexts that only emit changed fields.
    #[inline]
    pub const fn is_changed_only(self) -> bool {
        matches!(self, Self::Patch)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Create => "create",
            Self::Patch => "patch",
        }
    }
}

impl fmt::Display for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// ViewContexts

bitflags! {
    /// A set of [`ViewContext`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ViewContexts: u8 {
        const DEFAULT = 1;
        const CREATE = 1 << 1;
        const PATCH = 1 << 2;
    }
}

impl ViewContexts {
    #[inline]
    pub const fn includes(self, context: ViewContext) -> bool {
        self.contains(context.flag())
    }
}

impl From<ViewContext> for ViewContexts {
    #[inline]
    fn from(context: ViewContext) -> Self {
        context.flag()
    }
}
