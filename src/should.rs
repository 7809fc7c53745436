//! The assertion engine and its execution wrapper.
//!
//! Every assertion has the shape `check(expected, actuals...)`: one expected
//! value (or named type) against a list of actual values, each checked in
//! order, erroring with the zero-based index of the first violation. There
//! is no short-circuit across assertion *calls* in a batch; only within a
//! single multi-value call.
//!
//! A batch of assertions runs under [`execute_tests`], the failure-isolating
//! boundary: a [`Failure`] escaping the batch is caught, printed as a framed
//! message, and the run continues; a [`Fatal`] is never caught and aborts
//! the whole run.
//!
//! All assertions are `#[track_caller]`, so a failure reports the line of
//! the assertion call inside the test unit, not engine internals.

use std::panic::Location;

use crate::cli::output::{OutputSink, StdoutSink};
use crate::errors::{AttestError, Failure, Fatal, Raised};
use crate::reflect::{self, TypeKind, TypeRegistry};
use crate::value::Value;

// ============================================================================
// SUBJECTS - type names and live instances
// ============================================================================

/// Resolves a reflection subject to its type name.
///
/// A subject is either a type-name string (the `str` impl returns itself)
/// or a live instance of a type that knows its registered name. This is the
/// seam the reflection assertions accept subjects through.
pub trait Reflect {
    fn reflect_type(&self) -> &str;
}

impl Reflect for str {
    fn reflect_type(&self) -> &str {
        self
    }
}

impl Reflect for &str {
    fn reflect_type(&self) -> &str {
        self
    }
}

impl Reflect for String {
    fn reflect_type(&self) -> &str {
        self.as_str()
    }
}

/// A subject must resolve to a *registered* type; anything else is caller
/// misuse and propagates as a fatal error, not a failed expectation.
fn resolve_subject(registry: &TypeRegistry, subject: &dyn Reflect) -> Result<String, Fatal> {
    let name = subject.reflect_type().to_string();
    if registry.contains(&name) {
        Ok(name)
    } else {
        Err(Fatal::UnregisteredSubject { name })
    }
}

// ============================================================================
// EXECUTION WRAPPER
// ============================================================================

/// Runs one assertion batch inside the failure boundary, printing any
/// failure to stdout. See [`execute_tests_to`].
pub fn execute_tests<F>(tests: F) -> Result<(), Fatal>
where
    F: FnOnce() -> Result<(), AttestError>,
{
    execute_tests_to(&mut StdoutSink, tests)
}

/// Runs one assertion batch inside the failure boundary.
///
/// Catches exactly [`AttestError::Failure`]: the framed message goes to the
/// sink and the call returns `Ok(())`, so the batch stops but the overall
/// run continues. A [`Fatal`] passes through untouched and is expected to
/// abort the run.
pub fn execute_tests_to<F>(sink: &mut dyn OutputSink, tests: F) -> Result<(), Fatal>
where
    F: FnOnce() -> Result<(), AttestError>,
{
    match tests() {
        Ok(()) => Ok(()),
        Err(AttestError::Failure(failure)) => {
            dump_failure(sink, &failure);
            Ok(())
        }
        Err(AttestError::Fatal(fatal)) => Err(fatal),
    }
}

/// Prints one framed failure to the output channel.
pub fn dump_failure(sink: &mut dyn OutputSink, failure: &Failure) {
    sink.emit(&format!("\n{}", failure));
}

// ============================================================================
// be / not_be - strict equality
// ============================================================================

/// Asserts that every value is strictly equal to the expected value
/// (same type and same payload).
#[track_caller]
pub fn be(expected: &Value, values: &[Value]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if expected != value {
            return Err(Failure::at(
                caller,
                format!(
                    "[{k}] expected: {}: '{}' is not strictly equal to actual: {}: '{}'",
                    expected.type_name(),
                    expected,
                    value.type_name(),
                    value
                ),
            )
            .into());
        }
    }
    Ok(())
}

/// Asserts that no value is strictly equal to the expected value.
#[track_caller]
pub fn not_be(expected: &Value, values: &[Value]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if expected == value {
            return Err(Failure::at(
                caller,
                format!(
                    "[{k}] {}: '{}' is strictly equal to {}: '{}'",
                    expected.type_name(),
                    expected,
                    value.type_name(),
                    value
                ),
            )
            .into());
        }
    }
    Ok(())
}

// ============================================================================
// equal / not_equal - loose equality
// ============================================================================

/// Asserts that every value loosely equals the expected value, under the
/// coercion rules of [`Value::loose_eq`].
#[track_caller]
pub fn equal(expected: &Value, values: &[Value]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if !expected.loose_eq(value) {
            return Err(Failure::at(
                caller,
                format!(
                    "[{k}] expected: {}: '{}' does not equal actual: {}: '{}'",
                    expected.type_name(),
                    expected,
                    value.type_name(),
                    value
                ),
            )
            .into());
        }
    }
    Ok(())
}

/// Asserts that no value loosely equals the expected value.
#[track_caller]
pub fn not_equal(expected: &Value, values: &[Value]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if expected.loose_eq(value) {
            return Err(Failure::at(
                caller,
                format!(
                    "[{k}] {}: '{}' is equal to {}: '{}'",
                    expected.type_name(),
                    expected,
                    value.type_name(),
                    value
                ),
            )
            .into());
        }
    }
    Ok(())
}

// ============================================================================
// be_true / be_false / be_null
// ============================================================================

/// Asserts that every value is `true`.
#[track_caller]
pub fn be_true(values: &[bool]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if !*value {
            return Err(Failure::at(caller, format!("[{k}] value is not true")).into());
        }
    }
    Ok(())
}

/// Asserts that no value is `true`.
#[track_caller]
pub fn not_be_true(values: &[bool]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if *value {
            return Err(Failure::at(caller, format!("[{k}] value is true")).into());
        }
    }
    Ok(())
}

/// Asserts that every value is `false`.
#[track_caller]
pub fn be_false(values: &[bool]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if *value {
            return Err(Failure::at(caller, format!("[{k}] value is not false")).into());
        }
    }
    Ok(())
}

/// Asserts that no value is `false`.
#[track_caller]
pub fn not_be_false(values: &[bool]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if !*value {
            return Err(Failure::at(caller, format!("[{k}] value is false")).into());
        }
    }
    Ok(())
}

/// Asserts that every value is the null value.
#[track_caller]
pub fn be_null(values: &[Value]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if !value.is_nil() {
            return Err(
                Failure::at(caller, format!("[{k}] {} is not null", value.type_name())).into(),
            );
        }
    }
    Ok(())
}

/// Asserts that no value is the null value.
#[track_caller]
pub fn not_be_null(values: &[Value]) -> Result<(), AttestError> {
    let caller = Location::caller();
    for (k, value) in values.iter().enumerate() {
        if value.is_nil() {
            return Err(Failure::at(caller, format!("[{k}] value is null")).into());
        }
    }
    Ok(())
}

// ============================================================================
// have_methods / not_have_methods
// ============================================================================

/// Asserts that the subject's type exposes every named callable member,
/// whether declared directly, inherited, or provided by a composed mixin.
#[track_caller]
pub fn have_methods(subject: &dyn Reflect, methods: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|registry| {
        let type_name = resolve_subject(registry, subject)?;
        for (k, method) in methods.iter().enumerate() {
            if !registry.has_method(&type_name, method) {
                return Err(Failure::at(
                    caller,
                    format!("[{k}] method '{method}' does not exist on '{type_name}'"),
                )
                .into());
            }
        }
        Ok(())
    })
}

/// Asserts that the subject's type exposes none of the named members.
#[track_caller]
pub fn not_have_methods(subject: &dyn Reflect, methods: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|registry| {
        let type_name = resolve_subject(registry, subject)?;
        for (k, method) in methods.iter().enumerate() {
            if registry.has_method(&type_name, method) {
                return Err(Failure::at(
                    caller,
                    format!("[{k}] method '{method}' exists on '{type_name}'"),
                )
                .into());
            }
        }
        Ok(())
    })
}

// ============================================================================
// be_a / not_be_a - assignability
// ============================================================================

/// Asserts that the subject is assignable to every named type: its own
/// type, or any transitive supertype (inherited or implemented).
#[track_caller]
pub fn be_a(subject: &dyn Reflect, types: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|registry| {
        let type_name = resolve_subject(registry, subject)?;
        for (k, target) in types.iter().enumerate() {
            if !registry.is_a(&type_name, target) {
                return Err(Failure::at(
                    caller,
                    format!("[{k}] '{type_name}' is not a '{target}'"),
                )
                .into());
            }
        }
        Ok(())
    })
}

/// Asserts that the subject is assignable to none of the named types.
#[track_caller]
pub fn not_be_a(subject: &dyn Reflect, types: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|registry| {
        let type_name = resolve_subject(registry, subject)?;
        for (k, target) in types.iter().enumerate() {
            if registry.is_a(&type_name, target) {
                return Err(
                    Failure::at(caller, format!("[{k}] '{type_name}' is a '{target}'")).into(),
                );
            }
        }
        Ok(())
    })
}

// ============================================================================
// type existence by kind
// ============================================================================

fn check_kind_exists(
    registry: &TypeRegistry,
    caller: &Location<'_>,
    kind: TypeKind,
    names: &[&str],
    expect_absent: bool,
) -> Result<(), AttestError> {
    for (k, name) in names.iter().enumerate() {
        let exists = registry.kind_of(name) == Some(kind);
        if exists == expect_absent {
            let message = if expect_absent {
                format!("[{k}] {kind} '{name}' exists")
            } else {
                format!("[{k}] {kind} '{name}' does not exist")
            };
            return Err(Failure::at(caller, message).into());
        }
    }
    Ok(())
}

/// Enum assertions carry an environment precondition: a registry without
/// enum support makes them a fatal error before any per-item checking.
fn check_enum_exists(
    registry: &TypeRegistry,
    caller: &Location<'_>,
    names: &[&str],
    expect_absent: bool,
) -> Result<(), AttestError> {
    if !registry.supports_enums() {
        return Err(Fatal::EnumsUnsupported.into());
    }
    check_kind_exists(registry, caller, TypeKind::Enum, names, expect_absent)
}

/// Asserts that a class declaration exists for every name.
#[track_caller]
pub fn be_a_class(classes: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_kind_exists(r, caller, TypeKind::Class, classes, false))
}

/// Asserts that no class declaration exists for any name.
#[track_caller]
pub fn not_be_a_class(classes: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_kind_exists(r, caller, TypeKind::Class, classes, true))
}

/// Asserts that an interface declaration exists for every name.
#[track_caller]
pub fn be_an_interface(interfaces: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_kind_exists(r, caller, TypeKind::Interface, interfaces, false))
}

/// Asserts that no interface declaration exists for any name.
#[track_caller]
pub fn not_be_an_interface(interfaces: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_kind_exists(r, caller, TypeKind::Interface, interfaces, true))
}

/// Asserts that a mixin trait declaration exists for every name.
#[track_caller]
pub fn be_a_trait(traits: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_kind_exists(r, caller, TypeKind::Trait, traits, false))
}

/// Asserts that no mixin trait declaration exists for any name.
#[track_caller]
pub fn not_be_a_trait(traits: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_kind_exists(r, caller, TypeKind::Trait, traits, true))
}

/// Asserts that an enum declaration exists for every name.
#[track_caller]
pub fn be_an_enum(enums: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_enum_exists(r, caller, enums, false))
}

/// Asserts that no enum declaration exists for any name.
#[track_caller]
pub fn not_be_an_enum(enums: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|r| check_enum_exists(r, caller, enums, true))
}

// ============================================================================
// have_trait / not_have_trait - direct composition
// ============================================================================

/// Asserts that the subject's type directly composes every named mixin.
/// Composition inherited from a parent does not count.
#[track_caller]
pub fn have_trait(subject: &dyn Reflect, traits: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|registry| {
        let type_name = resolve_subject(registry, subject)?;
        for (k, mixin) in traits.iter().enumerate() {
            if !registry.uses_trait(&type_name, mixin) {
                return Err(Failure::at(
                    caller,
                    format!("[{k}] '{type_name}' does not use trait '{mixin}'"),
                )
                .into());
            }
        }
        Ok(())
    })
}

/// Asserts that the subject's type directly composes none of the named
/// mixins.
#[track_caller]
pub fn not_have_trait(subject: &dyn Reflect, traits: &[&str]) -> Result<(), AttestError> {
    let caller = Location::caller();
    reflect::with_global(|registry| {
        let type_name = resolve_subject(registry, subject)?;
        for (k, mixin) in traits.iter().enumerate() {
            if registry.uses_trait(&type_name, mixin) {
                return Err(Failure::at(
                    caller,
                    format!("[{k}] '{type_name}' uses trait '{mixin}'"),
                )
                .into());
            }
        }
        Ok(())
    })
}

// ============================================================================
// throw / not_throw - exception expectations
// ============================================================================

fn raised_matches(raised: &Raised, exception: &str) -> bool {
    raised.type_name == exception
        || reflect::with_global(|registry| registry.is_a(&raised.type_name, exception))
}

/// Asserts that every callable raises the named error type or a registered
/// subtype of it.
///
/// Completing without raising is a failure; raising an unrelated type is a
/// failure reporting the actually-raised type, message, and raise site.
#[track_caller]
pub fn throw<F>(exception: &str, callables: impl IntoIterator<Item = F>) -> Result<(), AttestError>
where
    F: FnOnce() -> Result<Value, Raised>,
{
    let caller = Location::caller();
    for (k, callable) in callables.into_iter().enumerate() {
        match callable() {
            Ok(_) => {
                return Err(
                    Failure::at(caller, format!("[{k}] '{exception}' was not thrown")).into(),
                );
            }
            Err(raised) => {
                if !raised_matches(&raised, exception) {
                    return Err(Failure::at(
                        caller,
                        format!(
                            "[{k}] '{exception}' was not thrown, '{}' was thrown instead: {} in {} on line {}",
                            raised.type_name, raised.message, raised.file, raised.line
                        ),
                    )
                    .with_cause(raised)
                    .into());
                }
            }
        }
    }
    Ok(())
}

/// Asserts that no callable raises the named error type (or a registered
/// subtype), collecting each callable's return value in call order.
///
/// A raise of any *other* type is neither suppressed nor a failure: it
/// propagates as a fatal error.
#[track_caller]
pub fn not_throw<F>(
    exception: &str,
    callables: impl IntoIterator<Item = F>,
) -> Result<Vec<Value>, AttestError>
where
    F: FnOnce() -> Result<Value, Raised>,
{
    let caller = Location::caller();
    let mut results = Vec::new();
    for (k, callable) in callables.into_iter().enumerate() {
        match callable() {
            Ok(value) => results.push(value),
            Err(raised) => {
                if raised_matches(&raised, exception) {
                    return Err(Failure::at(
                        caller,
                        format!(
                            "[{k}] '{exception}' was thrown: {} in {} on line {}",
                            raised.message, raised.file, raised.line
                        ),
                    )
                    .with_cause(raised)
                    .into());
                }
                return Err(Fatal::Unhandled(raised).into());
            }
        }
    }
    Ok(results)
}
