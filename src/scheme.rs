//! Schemes: reusable geometry definitions, and the registry resolving them.
//!
//! A [`Scheme`] describes how a family of plotted shapes behaves: when a
//! capture is complete, how captured positions turn into drawables, which
//! skeleton handle families edit it afterwards, and which cursor to show
//! while defining. Schemes are registered under a unique type name in a
//! [`SchemeRegistry`]; the registry is an explicit, injectable object (no
//! process-wide static) so tests can run against isolated registries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::drawable::Drawable;
use crate::geom::WorldPos;
use crate::product::Status;
use crate::skeleton::HandleFamily;

/// Boxed error for fallible scheme callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Predicate over the captured positions.
pub type CompletePredicate = Box<dyn Fn(&[WorldPos]) -> bool + Send + Sync>;

/// Render callback: captured state in, drawable set out.
pub type RenderFn = Box<dyn Fn(&RenderContext<'_>) -> Result<Vec<Drawable>, BoxError> + Send + Sync>;

/// Cursor closure evaluated against the captured positions.
pub type CursorFn = Box<dyn Fn(&[WorldPos]) -> CursorStyle + Send + Sync>;

/// Cursor styles a scene may display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorStyle {
    Default,
    Crosshair,
    Pointer,
    Grab,
    Grabbing,
}

/// The cursor shown while a product of this scheme is being defined.
pub enum DefiningCursor {
    Fixed(CursorStyle),
    Dynamic(CursorFn),
}

impl DefiningCursor {
    pub fn for_positions(&self, positions: &[WorldPos]) -> CursorStyle {
        match self {
            DefiningCursor::Fixed(style) => *style,
            DefiningCursor::Dynamic(f) => f(positions),
        }
    }
}

/// Everything a scheme's render callback gets to see.
pub struct RenderContext<'a> {
    /// Positions captured so far.
    pub positions: &'a [WorldPos],
    /// Status of the owning product.
    pub status: Status,
    /// Preview point under the pointer; `Some` only while defining.
    pub mouse: Option<WorldPos>,
    /// The drawables produced by the previous render, for id reuse.
    pub previous: &'a [Drawable],
}

/// A registered, effectively immutable geometry definition.
pub struct Scheme {
    type_name: String,
    complete: Option<CompletePredicate>,
    force_complete: Option<CompletePredicate>,
    render: RenderFn,
    skeletons: Vec<HandleFamily>,
    defining_cursor: Option<DefiningCursor>,
}

impl Scheme {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether the captured positions satisfy the completion predicate.
    /// Schemes without one never auto-complete.
    pub fn is_complete(&self, positions: &[WorldPos]) -> bool {
        match &self.complete {
            Some(f) => f(positions),
            None => false,
        }
    }

    /// Whether a forced completion (double click, switch-away) succeeds.
    /// Falls back to the regular completion predicate when no dedicated one
    /// is set.
    pub fn is_force_complete(&self, positions: &[WorldPos]) -> bool {
        match &self.force_complete {
            Some(f) => f(positions),
            None => self.is_complete(positions),
        }
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Drawable>, BoxError> {
        (self.render)(ctx)
    }

    /// Skeleton handle families this scheme exposes for editing.
    pub fn skeletons(&self) -> &[HandleFamily] {
        &self.skeletons
    }

    /// Cursor to show while defining, if the scheme declares one.
    pub fn defining_cursor(&self, positions: &[WorldPos]) -> Option<CursorStyle> {
        self.defining_cursor
            .as_ref()
            .map(|c| c.for_positions(positions))
    }
}

/// Builder for [`Scheme`].
pub struct SchemeOptions {
    type_name: String,
    complete: Option<CompletePredicate>,
    force_complete: Option<CompletePredicate>,
    render: RenderFn,
    skeletons: Vec<HandleFamily>,
    defining_cursor: Option<DefiningCursor>,
}

impl SchemeOptions {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            complete: None,
            force_complete: None,
            render: Box::new(|_| Ok(Vec::new())),
            skeletons: Vec::new(),
            defining_cursor: None,
        }
    }

    pub fn complete(mut self, f: impl Fn(&[WorldPos]) -> bool + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn force_complete(
        mut self,
        f: impl Fn(&[WorldPos]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.force_complete = Some(Box::new(f));
        self
    }

    pub fn render(
        mut self,
        f: impl Fn(&RenderContext<'_>) -> Result<Vec<Drawable>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.render = Box::new(f);
        self
    }

    pub fn skeletons(mut self, families: impl IntoIterator<Item = HandleFamily>) -> Self {
        self.skeletons = families.into_iter().collect();
        self
    }

    pub fn defining_cursor(mut self, style: CursorStyle) -> Self {
        self.defining_cursor = Some(DefiningCursor::Fixed(style));
        self
    }

    pub fn defining_cursor_fn(
        mut self,
        f: impl Fn(&[WorldPos]) -> CursorStyle + Send + Sync + 'static,
    ) -> Self {
        self.defining_cursor = Some(DefiningCursor::Dynamic(Box::new(f)));
        self
    }

    pub fn build(self) -> Scheme {
        Scheme {
            type_name: self.type_name,
            complete: self.complete,
            force_complete: self.force_complete,
            render: self.render,
            skeletons: self.skeletons,
            defining_cursor: self.defining_cursor,
        }
    }
}

/// Errors from scheme registration and resolution.
#[derive(Debug, Error)]
pub enum SchemeError {
    /// Registration (or resolution of options) with an empty type name.
    #[error("scheme type name must not be empty")]
    EmptyType,
    /// A type-name lookup found no registration.
    #[error("no scheme registered under type `{0}`")]
    NotFound(String),
}

/// The three ways a scheme can be identified when constructing a product.
pub enum SchemeRef {
    /// A registered type name.
    Name(String),
    /// A pre-built scheme instance.
    Instance(Arc<Scheme>),
    /// Inline construction options.
    Options(SchemeOptions),
}

impl From<&str> for SchemeRef {
    fn from(name: &str) -> Self {
        SchemeRef::Name(name.to_string())
    }
}

impl From<String> for SchemeRef {
    fn from(name: String) -> Self {
        SchemeRef::Name(name)
    }
}

impl From<Arc<Scheme>> for SchemeRef {
    fn from(scheme: Arc<Scheme>) -> Self {
        SchemeRef::Instance(scheme)
    }
}

impl From<Scheme> for SchemeRef {
    fn from(scheme: Scheme) -> Self {
        SchemeRef::Instance(Arc::new(scheme))
    }
}

impl From<SchemeOptions> for SchemeRef {
    fn from(options: SchemeOptions) -> Self {
        SchemeRef::Options(options)
    }
}

/// Named scheme registry with controlled lifetime.
///
/// Re-registering an existing type name is last-registration-wins and logs a
/// warning; only an empty type name is a hard error.
#[derive(Default)]
pub struct SchemeRegistry {
    schemes: HashMap<String, Arc<Scheme>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scheme: Scheme) -> Result<Arc<Scheme>, SchemeError> {
        if scheme.type_name.is_empty() {
            return Err(SchemeError::EmptyType);
        }
        if self.schemes.contains_key(&scheme.type_name) {
            warn!(
                scheme = %scheme.type_name,
                "re-registering scheme type; previous registration replaced"
            );
        }
        let scheme = Arc::new(scheme);
        self.schemes
            .insert(scheme.type_name.clone(), Arc::clone(&scheme));
        Ok(scheme)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemes.contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<Scheme>> {
        self.schemes.get(type_name).cloned()
    }

    /// Resolve a name, an instance, or inline options to a scheme.
    pub fn resolve(&self, scheme: impl Into<SchemeRef>) -> Result<Arc<Scheme>, SchemeError> {
        match scheme.into() {
            SchemeRef::Name(name) => self
                .get(&name)
                .ok_or(SchemeError::NotFound(name)),
            SchemeRef::Instance(scheme) => Ok(scheme),
            SchemeRef::Options(options) => {
                if options.type_name.is_empty() {
                    return Err(SchemeError::EmptyType);
                }
                Ok(Arc::new(options.build()))
            }
        }
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(name: &str) -> Scheme {
        SchemeOptions::new(name).build()
    }

    #[test]
    fn register_and_resolve_by_name() {
        let mut reg = SchemeRegistry::new();
        reg.register(dummy("Line")).unwrap();
        assert!(reg.contains("Line"));
        let scheme = reg.resolve("Line").unwrap();
        assert_eq!(scheme.type_name(), "Line");
    }

    #[test]
    fn empty_type_is_a_hard_error() {
        let mut reg = SchemeRegistry::new();
        assert!(matches!(
            reg.register(dummy("")),
            Err(SchemeError::EmptyType)
        ));
        assert!(matches!(
            reg.resolve(SchemeOptions::new("")),
            Err(SchemeError::EmptyType)
        ));
    }

    #[test]
    fn unknown_name_fails_fast() {
        let reg = SchemeRegistry::new();
        match reg.resolve("Nope") {
            Err(SchemeError::NotFound(name)) => assert_eq!(name, "Nope"),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = SchemeRegistry::new();
        reg.register(SchemeOptions::new("P").complete(|p| p.len() >= 1).build())
            .unwrap();
        reg.register(SchemeOptions::new("P").complete(|p| p.len() >= 5).build())
            .unwrap();
        let scheme = reg.resolve("P").unwrap();
        assert!(!scheme.is_complete(&[WorldPos::ZERO]));
        assert!(scheme.is_complete(&[WorldPos::ZERO; 5]));
    }

    #[test]
    fn resolve_accepts_instances_and_options() {
        let reg = SchemeRegistry::new();
        let inst = Arc::new(dummy("Inline"));
        assert_eq!(reg.resolve(Arc::clone(&inst)).unwrap().type_name(), "Inline");
        assert_eq!(
            reg.resolve(SchemeOptions::new("FromOptions"))
                .unwrap()
                .type_name(),
            "FromOptions"
        );
    }

    #[test]
    fn force_complete_falls_back_to_complete() {
        let scheme = SchemeOptions::new("L").complete(|p| p.len() >= 2).build();
        assert!(!scheme.is_force_complete(&[WorldPos::ZERO]));
        assert!(scheme.is_force_complete(&[WorldPos::ZERO, WorldPos::ONE]));

        let scheme = SchemeOptions::new("Pg")
            .force_complete(|p| p.len() >= 3)
            .build();
        assert!(!scheme.is_complete(&[WorldPos::ZERO; 3]));
        assert!(scheme.is_force_complete(&[WorldPos::ZERO; 3]));
    }

    #[test]
    fn dynamic_cursor_sees_positions() {
        let scheme = SchemeOptions::new("C")
            .defining_cursor_fn(|positions| {
                if positions.is_empty() {
                    CursorStyle::Crosshair
                } else {
                    CursorStyle::Pointer
                }
            })
            .build();
        assert_eq!(scheme.defining_cursor(&[]), Some(CursorStyle::Crosshair));
        assert_eq!(
            scheme.defining_cursor(&[WorldPos::ZERO]),
            Some(CursorStyle::Pointer)
        );
    }
}
