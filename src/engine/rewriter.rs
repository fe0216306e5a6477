//! The rewrite phase: patch every use site of a removed element.
//!
//! One pass over every behavior body of every kept class, dispatching on the
//! closed [`SiteKind`] union with a single total match — a construct kind
//! without a rewrite rule does not compile. Each decision depends only on
//! the frozen removal set and the construct's own override metadata, so
//! bodies rewrite in parallel, one rayon task per class.
//!
//! Two rules deliberately trigger on types that are NOT in the removal set:
//! array creations and exception handlers substitute a concrete
//! representative type for a *kept* type. The integration tests pin this
//! inverted guard down; do not "fix" it here without updating them.

use crossbeam_skiplist::SkipMap;
use log::{info, trace};
use rayon::prelude::*;

use crate::{
    annotations::resolver::AnnotationResolver,
    engine::{bindings::FeatureBindings, removal::RemovalSet},
    model::{
        body::{Site, SiteKind, SourceFragment},
        handle::{Handle, HandleKind},
        registry::ClassRegistry,
    },
    Error, Result,
};

/// One applied patch, for the run report.
#[derive(Clone, Debug)]
pub struct RewriteEvent {
    /// The behavior whose body was patched
    pub behavior: Handle,
    /// Index of the patched construct within the body
    pub site_index: usize,
    /// Construct kind, e.g. `MethodCall`
    pub kind: String,
    /// The replacement fragment text (empty for a no-op)
    pub replacement: String,
}

/// Shared state of one rewrite run: the frozen inputs plus the thread-safe
/// caches the parallel workers append to. Owned by the run and passed by
/// reference; nothing here is global.
pub struct RewriteContext<'a> {
    registry: &'a ClassRegistry,
    removal: &'a RemovalSet,
    bindings: &'a FeatureBindings,
    recurse: bool,
    /// Compiled override fragments, keyed by the annotated element. The
    /// compile role follows the element kind: classes compile as type
    /// names, members as expressions.
    overrides: SkipMap<Handle, Option<SourceFragment>>,
    events: boxcar::Vec<RewriteEvent>,
}

impl<'a> RewriteContext<'a> {
    /// Creates the context for one run.
    #[must_use]
    pub fn new(
        registry: &'a ClassRegistry,
        removal: &'a RemovalSet,
        bindings: &'a FeatureBindings,
        recurse: bool,
    ) -> Self {
        RewriteContext {
            registry,
            removal,
            bindings,
            recurse,
            overrides: SkipMap::new(),
            events: boxcar::Vec::new(),
        }
    }

    /// Consumes the context and returns the applied patches, ordered by
    /// behavior and site index (parallel workers append out of order).
    #[must_use]
    pub fn take_events(self) -> Vec<RewriteEvent> {
        let mut events: Vec<RewriteEvent> = self.events.into_iter().collect();
        events.sort_by_key(|e| (e.behavior, e.site_index));
        events
    }

    /// The validated override fragment of an element, if its (possibly
    /// inherited) annotation carries one. Compiled once, then served from
    /// the cache.
    ///
    /// # Errors
    /// Returns [`Error::Rewrite`] naming the element when the override text
    /// does not validate for the element's role.
    fn override_for(&self, element: Handle) -> Result<Option<SourceFragment>> {
        if let Some(entry) = self.overrides.get(&element) {
            return Ok(entry.value().clone());
        }

        let resolver = AnnotationResolver::new(self.registry);
        let compiled = match resolver
            .resolve(element, self.recurse)
            .as_ref()
            .and_then(|a| a.override_value().map(str::to_string))
        {
            Some(text) => {
                let compiled = match element.kind() {
                    Some(HandleKind::Class) => SourceFragment::type_name(&text),
                    _ => SourceFragment::expression(&text),
                };
                Some(compiled.map_err(|e| Error::Rewrite {
                    element: self.registry.element_name(element),
                    message: e.to_string(),
                })?)
            }
            None => None,
        };

        self.overrides.insert(element, compiled.clone());
        Ok(compiled)
    }

    /// Combined removal verdict for a member: itself marked, or its
    /// declaring class marked.
    fn member_erased(&self, member: Handle) -> bool {
        self.removal.is_member_removed(member)
            || self
                .registry
                .declaring_class(member)
                .is_some_and(|c| self.removal.is_class_removed(c))
    }
}

/// Rewrites every behavior body of every kept class.
///
/// Bodies of classes that are themselves scheduled for removal are skipped;
/// those classes vanish entirely in the elimination phase.
///
/// # Errors
/// Returns [`Error::Rewrite`] on an invalid override fragment and
/// [`Error::Structural`] when a triggered site references an element the
/// model cannot produce; either aborts the whole run.
pub fn rewrite(ctx: &RewriteContext<'_>) -> Result<()> {
    let handles = ctx.registry.class_handles();
    handles
        .par_iter()
        .try_for_each(|&class| rewrite_class(ctx, class))?;

    info!(
        "rewrite phase complete: {} sites patched",
        ctx.events.count()
    );
    Ok(())
}

fn rewrite_class(ctx: &RewriteContext<'_>, class_handle: Handle) -> Result<()> {
    if ctx.removal.is_class_removed(class_handle) {
        return Ok(());
    }
    let class = ctx
        .registry
        .class(class_handle)
        .ok_or_else(|| structural_error!("class {} vanished during rewriting", class_handle))?;

    for behavior in class.behaviors() {
        rewrite_body(ctx, behavior)?;
    }
    Ok(())
}

fn rewrite_body(ctx: &RewriteContext<'_>, behavior: Handle) -> Result<()> {
    // Abstract behaviors carry no body.
    let Some(mut body) = ctx.registry.body_mut(behavior) else {
        return Ok(());
    };

    let mut patches = Vec::new();
    for (index, site) in body.sites() {
        if let Some(fragment) = decide(ctx, site)? {
            trace!(
                "patching {} site {} in {}: '{}' -> '{}'",
                site.kind,
                index,
                ctx.registry.element_name(behavior),
                site.text,
                fragment.as_str()
            );
            patches.push((index, site.kind.to_string(), fragment));
        }
    }

    for (index, kind, fragment) in patches {
        ctx.events.push(RewriteEvent {
            behavior,
            site_index: index,
            kind,
            replacement: fragment.as_str().to_string(),
        });
        body.replace(index, fragment)?;
    }
    Ok(())
}

/// The rewrite rule table: one total match over every construct kind.
/// Returns the replacement fragment, or `None` when the site stays as it
/// is.
fn decide(ctx: &RewriteContext<'_>, site: &Site) -> Result<Option<SourceFragment>> {
    match &site.kind {
        SiteKind::Cast { target } => {
            if !ctx.removal.is_class_removed(*target) {
                return Ok(None);
            }
            Ok(Some(match ctx.override_for(*target)? {
                Some(ty) => SourceFragment::assembled(format!("$_ = ({}) $1;", ty.as_str())),
                None => SourceFragment::assembled("$_ = null;".to_string()),
            }))
        }

        SiteKind::InstanceofTest { target } => {
            if !ctx.removal.is_class_removed(*target) {
                return Ok(None);
            }
            Ok(Some(match ctx.override_for(*target)? {
                Some(ty) => {
                    SourceFragment::assembled(format!("$_ = $1 instanceof {};", ty.as_str()))
                }
                None => SourceFragment::assembled("$_ = false;".to_string()),
            }))
        }

        SiteKind::FieldRead { field } => {
            if !ctx.member_erased(*field) {
                return Ok(None);
            }
            let field_rc = ctx
                .registry
                .field(*field)
                .ok_or_else(|| structural_error!("removed field {} not in model", field))?;
            let value = match ctx.override_for(*field)? {
                Some(expr) => expr.as_str().to_string(),
                None => field_rc.ty.default_literal().unwrap_or("null").to_string(),
            };
            Ok(Some(SourceFragment::assembled(format!("$_ = {};", value))))
        }

        SiteKind::FieldWrite { field } => {
            if ctx.member_erased(*field) {
                // The right-hand side was only evaluated for its value;
                // dropping the assignment drops it.
                return Ok(Some(SourceFragment::noop()));
            }
            // Configuration baking: a kept static field whose bound-value
            // directive names an id bound with a value gets the literal
            // assigned instead.
            let Some(field_rc) = ctx.registry.field(*field) else {
                return Ok(None);
            };
            if !field_rc
                .flags
                .contains(crate::model::elements::MemberFlags::STATIC)
            {
                return Ok(None);
            }
            let resolver = AnnotationResolver::new(ctx.registry);
            let Some(directive) = resolver.resolve_bound_value(*field, ctx.recurse) else {
                return Ok(None);
            };
            let Some(literal) = ctx.bindings.value(&directive.id) else {
                return Ok(None);
            };
            let class_name = ctx
                .registry
                .class(field_rc.declaring)
                .map_or_else(|| field_rc.declaring.to_string(), |c| c.name.clone());
            Ok(Some(SourceFragment::assembled(format!(
                "{}.{} = {};",
                class_name, field_rc.name, literal
            ))))
        }

        SiteKind::MethodCall { method } => {
            if !ctx.member_erased(*method) {
                return Ok(None);
            }
            let method_rc = ctx
                .registry
                .method(*method)
                .ok_or_else(|| structural_error!("removed method {} not in model", method))?;
            if method_rc.ret.is_void() {
                return Ok(Some(SourceFragment::noop()));
            }
            let value = match ctx.override_for(*method)? {
                Some(expr) => expr.as_str().to_string(),
                None => method_rc.ret.default_literal().unwrap_or("null").to_string(),
            };
            Ok(Some(SourceFragment::assembled(format!("$_ = {};", value))))
        }

        SiteKind::CtorCall { ctor } => {
            // Explicit super(...)/this(...) sites live in subclasses or
            // sibling constructors of kept classes; only the individual
            // constructor verdict applies here.
            if ctx.removal.is_member_removed(*ctor) {
                Ok(Some(SourceFragment::noop()))
            } else {
                Ok(None)
            }
        }

        SiteKind::NewObject { ctor } => {
            if !ctx.member_erased(*ctor) {
                return Ok(None);
            }
            let declaring = ctx
                .registry
                .declaring_class(*ctor)
                .ok_or_else(|| structural_error!("removed constructor {} not in model", ctor))?;
            // The replacement class is named by the annotation on the
            // created class, not on the constructor.
            Ok(Some(match ctx.override_for(declaring)? {
                Some(ty) => SourceFragment::assembled(format!("$_ = new {}($$);", ty.as_str())),
                None => SourceFragment::assembled("$_ = null;".to_string()),
            }))
        }

        SiteKind::NewArray { component, dims } => {
            // Literal guard: triggers for components that are NOT removed.
            if ctx.removal.is_class_removed(*component) {
                return Ok(None);
            }
            match ctx.override_for(*component)? {
                Some(ty) => {
                    let mut text = format!("$_ = new {}", ty.as_str());
                    for dim in 1..=*dims {
                        text.push_str(&format!("[${}]", dim));
                    }
                    text.push(';');
                    Ok(Some(SourceFragment::assembled(text)))
                }
                None => Ok(None),
            }
        }

        SiteKind::CatchHandler { caught } => {
            // Literal guard: triggers for caught types that are NOT removed.
            if ctx.removal.is_class_removed(*caught) {
                return Ok(None);
            }
            match ctx.override_for(*caught)? {
                Some(ty) => Ok(Some(SourceFragment::assembled(format!(
                    "{} $1;",
                    ty.as_str()
                )))),
                // No override: the handler is dropped and the exception
                // propagates to the next handler or the caller.
                None => Ok(Some(SourceFragment::noop())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        annotations::{BoundValueDirective, VariabilityAnnotation},
        engine::marker,
        model::{
            body::Construct,
            builder::{ClassBuilder, ConstructorBuilder, FieldBuilder, MethodBuilder},
            elements::MemberFlags,
            types::{PrimitiveKind, TypeDesc},
        },
    };

    fn int() -> TypeDesc {
        TypeDesc::Primitive(PrimitiveKind::Int)
    }

    fn run_rewrite(
        registry: &ClassRegistry,
        bindings: &FeatureBindings,
    ) -> (RemovalSet, Vec<RewriteEvent>) {
        let removal = marker::mark(registry, bindings, true);
        let ctx = RewriteContext::new(registry, &removal, bindings, true);
        rewrite(&ctx).unwrap();
        let events = ctx.take_events();
        (removal, events)
    }

    fn fragment_at(registry: &ClassRegistry, behavior: Handle, index: usize) -> String {
        match &registry.body(behavior).unwrap().constructs()[index] {
            Construct::Fragment(f) => f.as_str().to_string(),
            Construct::Site(site) => panic!("site not rewritten: {:?}", site),
        }
    }

    #[test]
    fn test_cast_to_removed_class_becomes_null() {
        let registry = ClassRegistry::new();
        let logger = ClassBuilder::new("Logger")
            .variability(VariabilityAnnotation::new(["logging"]))
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::Cast { target: logger }, "(Logger) o"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "$_ = null;");
    }

    #[test]
    fn test_cast_with_override_type() {
        let registry = ClassRegistry::new();
        let sensor = ClassBuilder::new("Sensor")
            .variability(VariabilityAnnotation::new(["sensors"]).with_override("DummySensor"))
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::Cast { target: sensor }, "(Sensor) o"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "$_ = (DummySensor) $1;");
    }

    #[test]
    fn test_instanceof_removed_class() {
        let registry = ClassRegistry::new();
        let logger = ClassBuilder::new("Logger")
            .variability(VariabilityAnnotation::new(["logging"]))
            .build(&registry)
            .unwrap();
        let sensor = ClassBuilder::new("Sensor")
            .variability(VariabilityAnnotation::new(["sensors"]).with_override("DummySensor"))
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(
                SiteKind::InstanceofTest { target: logger },
                "o instanceof Logger",
            ))
            .site(Site::new(
                SiteKind::InstanceofTest { target: sensor },
                "o instanceof Sensor",
            ))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "$_ = false;");
        assert_eq!(fragment_at(&registry, run, 1), "$_ = $1 instanceof DummySensor;");
    }

    #[test]
    fn test_field_read_gets_type_default() {
        let registry = ClassRegistry::new();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let count = FieldBuilder::new(app, "count", int())
            .variability(VariabilityAnnotation::new(["counters"]))
            .build(&registry)
            .unwrap();
        let flag = FieldBuilder::new(app, "flag", TypeDesc::Primitive(PrimitiveKind::Bool))
            .variability(VariabilityAnnotation::new(["counters"]))
            .build(&registry)
            .unwrap();
        let name = FieldBuilder::new(app, "name", TypeDesc::named("String"))
            .variability(VariabilityAnnotation::new(["counters"]))
            .build(&registry)
            .unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::FieldRead { field: count }, "count"))
            .site(Site::new(SiteKind::FieldRead { field: flag }, "flag"))
            .site(Site::new(SiteKind::FieldRead { field: name }, "name"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "$_ = 0;");
        assert_eq!(fragment_at(&registry, run, 1), "$_ = false;");
        assert_eq!(fragment_at(&registry, run, 2), "$_ = null;");
    }

    #[test]
    fn test_field_read_override_expression() {
        let registry = ClassRegistry::new();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let count = FieldBuilder::new(app, "count", int())
            .variability(VariabilityAnnotation::new(["counters"]).with_override("42"))
            .build(&registry)
            .unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::FieldRead { field: count }, "count"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "$_ = 42;");
    }

    #[test]
    fn test_field_write_dropped() {
        let registry = ClassRegistry::new();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let count = FieldBuilder::new(app, "count", int())
            .variability(VariabilityAnnotation::new(["counters"]))
            .build(&registry)
            .unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::FieldWrite { field: count }, "count = 1"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "");
    }

    #[test]
    fn test_static_write_bakes_bound_value() {
        let registry = ClassRegistry::new();
        let config = ClassBuilder::new("cfg.Config").build(&registry).unwrap();
        let interval = FieldBuilder::new(config, "interval", int())
            .flags(MemberFlags::PUBLIC | MemberFlags::STATIC)
            .bound_value(BoundValueDirective::new("poll.interval"))
            .build(&registry)
            .unwrap();
        let init = MethodBuilder::new(config, "init")
            .site(Site::new(SiteKind::FieldWrite { field: interval }, "interval = 100"))
            .build(&registry)
            .unwrap();

        let mut bindings = FeatureBindings::new();
        bindings.bind_value("poll.interval", "500");
        run_rewrite(&registry, &bindings);
        assert_eq!(
            fragment_at(&registry, init, 0),
            "cfg.Config.interval = 500;"
        );
    }

    #[test]
    fn test_static_write_without_bound_value_untouched() {
        let registry = ClassRegistry::new();
        let config = ClassBuilder::new("Config").build(&registry).unwrap();
        let interval = FieldBuilder::new(config, "interval", int())
            .flags(MemberFlags::STATIC)
            .bound_value(BoundValueDirective::new("poll.interval"))
            .build(&registry)
            .unwrap();
        let init = MethodBuilder::new(config, "init")
            .site(Site::new(SiteKind::FieldWrite { field: interval }, "interval = 100"))
            .build(&registry)
            .unwrap();

        // Active id without a bound value bakes nothing.
        let bindings: FeatureBindings = ["poll.interval"].into_iter().collect();
        run_rewrite(&registry, &bindings);
        let body = registry.body(init).unwrap();
        assert_eq!(body.sites().count(), 1);
    }

    #[test]
    fn test_void_call_becomes_noop_and_valued_call_default() {
        let registry = ClassRegistry::new();
        let logger = ClassBuilder::new("Logger")
            .variability(VariabilityAnnotation::new(["logging"]))
            .build(&registry)
            .unwrap();
        let log = MethodBuilder::new(logger, "log")
            .param(TypeDesc::named("String"))
            .build(&registry)
            .unwrap();
        let level = MethodBuilder::new(logger, "level")
            .returns(int())
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::MethodCall { method: log }, "logger.log(m)"))
            .site(Site::new(SiteKind::MethodCall { method: level }, "logger.level()"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "");
        assert_eq!(fragment_at(&registry, run, 1), "$_ = 0;");
    }

    #[test]
    fn test_removed_ctor_call_and_new_object() {
        let registry = ClassRegistry::new();
        let logger = ClassBuilder::new("Logger").build(&registry).unwrap();
        let ctor = ConstructorBuilder::new(logger)
            .variability(
                VariabilityAnnotation::new(["verbose"]).with_remove_if_disabled(false),
            )
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::NewObject { ctor }, "new Logger()"))
            .build(&registry)
            .unwrap();
        let sub = ClassBuilder::new("SubLogger").extends(logger).build(&registry).unwrap();
        let sub_ctor = ConstructorBuilder::new(sub)
            .site(Site::new(SiteKind::CtorCall { ctor }, "super()"))
            .build(&registry)
            .unwrap();

        let bindings: FeatureBindings = ["verbose"].into_iter().collect();
        run_rewrite(&registry, &bindings);
        assert_eq!(fragment_at(&registry, run, 0), "$_ = null;");
        assert_eq!(fragment_at(&registry, sub_ctor, 0), "");
    }

    #[test]
    fn test_new_object_override_comes_from_class() {
        let registry = ClassRegistry::new();
        let sensor = ClassBuilder::new("Sensor")
            .variability(VariabilityAnnotation::new(["sensors"]).with_override("DummySensor"))
            .build(&registry)
            .unwrap();
        let ctor = ConstructorBuilder::new(sensor).param(int()).build(&registry).unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::NewObject { ctor }, "new Sensor(3)"))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(fragment_at(&registry, run, 0), "$_ = new DummySensor($$);");
    }

    #[test]
    fn test_array_guard_triggers_on_kept_component() {
        // Deliberately inverted guard: the rule fires when the component
        // type is NOT removed. A kept class with an override gets its
        // arrays retyped; arrays of the removed class itself stay
        // untouched.
        let registry = ClassRegistry::new();
        let sensor = ClassBuilder::new("Sensor")
            .variability(VariabilityAnnotation::new(["sensors"]).with_override("DummySensor"))
            .build(&registry)
            .unwrap();
        let probe = ClassBuilder::new("Probe")
            .variability(
                VariabilityAnnotation::new(["never"])
                    .with_remove_if_disabled(false)
                    .with_override("DummySensor"),
            )
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(
                SiteKind::NewArray { component: sensor, dims: 1 },
                "new Sensor[3]",
            ))
            .site(Site::new(
                SiteKind::NewArray { component: probe, dims: 2 },
                "new Probe[3][4]",
            ))
            .build(&registry)
            .unwrap();

        let (removal, _) = run_rewrite(&registry, &FeatureBindings::new());
        assert!(removal.is_class_removed(sensor));
        assert!(!removal.is_class_removed(probe));

        let body = registry.body(run).unwrap();
        // Removed component: site untouched.
        assert!(matches!(body.constructs()[0], Construct::Site(_)));
        // Kept component with override: retyped, dimensionality preserved.
        assert_eq!(
            fragment_at(&registry, run, 1),
            "$_ = new DummySensor[$1][$2];"
        );
    }

    #[test]
    fn test_catch_guard_triggers_on_kept_caught_type() {
        // Same inverted guard as array creation: handlers for KEPT types
        // are rewritten — retyped with an override, dropped without one.
        // Handlers for removed types stay untouched.
        let registry = ClassRegistry::new();
        let removed_ex = ClassBuilder::new("MonitoringError")
            .variability(VariabilityAnnotation::new(["monitoring"]))
            .build(&registry)
            .unwrap();
        let retyped_ex = ClassBuilder::new("ProbeError")
            .variability(
                VariabilityAnnotation::new(["never"])
                    .with_remove_if_disabled(false)
                    .with_override("java.lang.RuntimeException"),
            )
            .build(&registry)
            .unwrap();
        let plain_ex = ClassBuilder::new("PlainError").build(&registry).unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(
                SiteKind::CatchHandler { caught: removed_ex },
                "catch (MonitoringError e)",
            ))
            .site(Site::new(
                SiteKind::CatchHandler { caught: retyped_ex },
                "catch (ProbeError e)",
            ))
            .site(Site::new(
                SiteKind::CatchHandler { caught: plain_ex },
                "catch (PlainError e)",
            ))
            .build(&registry)
            .unwrap();

        run_rewrite(&registry, &FeatureBindings::new());
        let body = registry.body(run).unwrap();
        assert!(matches!(body.constructs()[0], Construct::Site(_)));
        assert_eq!(fragment_at(&registry, run, 1), "java.lang.RuntimeException $1;");
        // Kept type, no override: handler dropped.
        assert_eq!(fragment_at(&registry, run, 2), "");
    }

    #[test]
    fn test_bodies_of_removed_classes_skipped() {
        let registry = ClassRegistry::new();
        let logger = ClassBuilder::new("Logger")
            .variability(VariabilityAnnotation::new(["logging"]))
            .build(&registry)
            .unwrap();
        let helper = ClassBuilder::new("Helper")
            .variability(VariabilityAnnotation::new(["logging"]))
            .build(&registry)
            .unwrap();
        let helper_m = MethodBuilder::new(helper, "assist").build(&registry).unwrap();
        let internal = MethodBuilder::new(logger, "flush")
            .site(Site::new(SiteKind::MethodCall { method: helper_m }, "assist()"))
            .build(&registry)
            .unwrap();

        let (removal, events) = run_rewrite(&registry, &FeatureBindings::new());
        assert!(removal.is_class_removed(logger));
        // The body inside the removed class keeps its site; the class
        // vanishes wholesale in the elimination phase.
        let body = registry.body(internal).unwrap();
        assert!(matches!(body.constructs()[0], Construct::Site(_)));
        assert!(events.is_empty());
    }

    #[test]
    fn test_invalid_override_is_fatal() {
        let registry = ClassRegistry::new();
        let sensor = ClassBuilder::new("Sensor")
            .variability(
                VariabilityAnnotation::new(["sensors"]).with_override("Dummy Sensor"),
            )
            .build(&registry)
            .unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let _run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::Cast { target: sensor }, "(Sensor) o"))
            .build(&registry)
            .unwrap();

        let bindings = FeatureBindings::new();
        let removal = marker::mark(&registry, &bindings, true);
        let ctx = RewriteContext::new(&registry, &removal, &bindings, true);
        let result = rewrite(&ctx);
        match result {
            Err(Error::Rewrite { element, .. }) => assert_eq!(element, "Sensor"),
            other => panic!("expected Error::Rewrite, got {:?}", other),
        }
    }

    #[test]
    fn test_events_are_ordered() {
        let registry = ClassRegistry::new();
        let logger = ClassBuilder::new("Logger")
            .variability(VariabilityAnnotation::new(["logging"]))
            .build(&registry)
            .unwrap();
        let log = MethodBuilder::new(logger, "log").build(&registry).unwrap();
        let app = ClassBuilder::new("App").build(&registry).unwrap();
        let run = MethodBuilder::new(app, "run")
            .site(Site::new(SiteKind::MethodCall { method: log }, "log()"))
            .site(Site::new(SiteKind::MethodCall { method: log }, "log()"))
            .build(&registry)
            .unwrap();

        let (_, events) = run_rewrite(&registry, &FeatureBindings::new());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].behavior, run);
        assert_eq!(events[0].site_index, 0);
        assert_eq!(events[1].site_index, 1);
        assert_eq!(events[0].kind, "MethodCall");
    }
}
