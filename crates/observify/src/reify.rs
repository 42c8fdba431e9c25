#![forbid(unsafe_code)]

//! Turning plain object properties into cell-backed ones.

use observify_reactive::Computed;

use crate::cell::{AnyCell, ComputedCell};
use crate::error::{Result, SyncError};
use crate::object::{Object, Slot};
use crate::options::SyncOptions;
use crate::sync::Synchronizer;
use crate::value::Value;

impl Synchronizer<'_> {
    /// Back `target[name]` by a cell and bring its value in line with
    /// `default`.
    pub(crate) fn reify(&self, target: &Object, name: &str, default: &Value) {
        let deep = self.options.deep;
        let (cell, created) = match target.slot(name) {
            Some(Slot::Reactive(cell)) => (cell, false),
            existing => {
                // The self-merge form hands a property its own value.
                let adopt = matches!(&existing, Some(Slot::Data(value)) if value.same(default));
                let initial = match default.empty_like() {
                    Some(empty) if deep && !adopt => empty,
                    _ => default.clone(),
                };
                let cell = AnyCell::new(initial);
                tracing::trace!(
                    message = "observify.reify",
                    property = name,
                    kind = default.kind_name(),
                    array = cell.is_array()
                );
                target.install(name, Slot::Reactive(cell.clone()));
                (cell, true)
            }
        };

        let current = cell.peek();
        if deep && current.is_composite() {
            if !default.is_composite() {
                return;
            }
            if current.kind() != default.kind() {
                self.write(&cell, name, self.instantiate(default));
                return;
            }
            if self.merge(&current, default, Some(name)) && !created {
                cell.notify();
            }
        } else if !current.same(default) {
            let value = if deep {
                self.instantiate(default)
            } else {
                default.clone()
            };
            self.write(&cell, name, value);
        }
    }

    fn write(&self, cell: &AnyCell, name: &str, value: Value) {
        if !cell.try_set(value) {
            tracing::trace!(message = "observify.skip_read_only", property = name);
        }
    }
}

fn target_object<'v>(target: &'v Value, operation: &str) -> Result<&'v Object> {
    target.as_object().ok_or_else(|| {
        SyncError::invalid(format!(
            "{operation} needs an object target, got {}",
            target.kind_name()
        ))
    })
}

/// Back `target[name]` by a reactive cell holding `default`.
///
/// An already reactive property keeps its cell; only its value is brought in
/// line with `default` (merged into, when deep and composite).
///
/// # Errors
///
/// [`SyncError::InvalidArgument`] if `target` is not an object. Nothing is
/// modified in that case.
pub fn reify_property(
    target: &Value,
    name: &str,
    default: &Value,
    options: &SyncOptions,
) -> Result<()> {
    let object = target_object(target, "reify_property")?;
    Synchronizer::new(options).reify(object, name, default);
    Ok(())
}

/// Install a read-only derived property. Writing it through
/// [`Object::set`] fails with [`SyncError::ReadOnly`]; synchronization skips
/// it.
///
/// Redefining a property replaces its previous cell unless it already is
/// this computed value.
///
/// # Errors
///
/// [`SyncError::InvalidArgument`] if `target` is not an object.
pub fn define_computed_property(
    target: &Value,
    name: &str,
    computed: Computed<Value>,
) -> Result<()> {
    let object = target_object(target, "define_computed_property")?;
    install_computed(object, name, ComputedCell::read_only(computed));
    Ok(())
}

/// Install a derived property whose writes are handed to `write`.
///
/// # Errors
///
/// [`SyncError::InvalidArgument`] if `target` is not an object.
pub fn define_writable_computed_property(
    target: &Value,
    name: &str,
    computed: Computed<Value>,
    write: impl Fn(Value) + 'static,
) -> Result<()> {
    let object = target_object(target, "define_writable_computed_property")?;
    install_computed(object, name, ComputedCell::writable(computed, write));
    Ok(())
}

fn install_computed(object: &Object, name: &str, cell: ComputedCell) {
    if let Some(AnyCell::Computed(existing)) = object.cell(name)
        && existing.computed().ptr_eq(cell.computed())
    {
        return;
    }
    tracing::trace!(message = "observify.reify", property = name, kind = "computed");
    object.install(name, Slot::Reactive(AnyCell::Computed(cell)));
}

/// Shallowly reify properties of `model` in place: all of them, or only
/// `names` when given. Nested composites are left plain; a named property
/// that does not exist yet starts out `Undefined`.
///
/// # Errors
///
/// [`SyncError::InvalidArgument`] if `model` is not an object.
pub fn track(model: &Value, names: Option<&[&str]>) -> Result<()> {
    let object = target_object(model, "track")?;
    let names: Vec<String> = match names {
        Some(names) => names.iter().map(|name| (*name).to_owned()).collect(),
        None => object.keys(),
    };
    let options = SyncOptions::shallow();
    let synchronizer = Synchronizer::new(&options);
    for name in names {
        let current = object.peek(&name).unwrap_or_default();
        synchronizer.reify(object, &name, &current);
    }
    Ok(())
}
