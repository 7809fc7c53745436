//! Default test units shipped with the runner.
//!
//! `should_tests` is the harness exercising its own assertion catalog: it
//! registers type metadata describing the engine, then asserts over it.
//! The deliberately failing `failing_tests` unit exists to observe framed
//! failure output end to end; it is registered only in debug builds or
//! under the `demo-fail` feature.

use crate::discovery;
use crate::errors::Fatal;
use crate::reflect::{self, TypeDecl};
use crate::should;
use crate::vals;

/// Registers the crate's own units with the test unit registry. Called by
/// the CLI before scanning; library users typically register their own
/// units instead of (or in addition to) these.
pub fn register_default_units() {
    discovery::register_unit("should_tests", run_should_tests);
    #[cfg(any(test, feature = "demo-fail", debug_assertions))]
    discovery::register_unit("failing_tests", run_failing_tests);
}

fn run_should_tests() -> Result<(), Fatal> {
    reflect::register(TypeDecl::class("Should").methods([
        "be",
        "not_be",
        "equal",
        "not_equal",
        "be_true",
        "not_be_true",
        "be_false",
        "not_be_false",
        "be_null",
        "not_be_null",
        "have_methods",
        "not_have_methods",
        "be_a",
        "not_be_a",
        "have_trait",
        "not_have_trait",
        "throw",
        "not_throw",
    ]));
    reflect::register(TypeDecl::class("Failure"));

    should::execute_tests(|| {
        should::have_methods(
            &"Should",
            &[
                "be_true",
                "not_be_true",
                "be_false",
                "not_be_false",
                "be_null",
                "not_be_null",
                "have_methods",
                "not_have_methods",
                "be_a",
                "not_be_a",
            ],
        )?;

        should::be_true(&[true, true])?;
        should::not_be_true(&[false, false])?;
        should::be_false(&[false, false])?;
        should::not_be_false(&[true, true])?;
        should::be_null(&vals![(), ()])?;
        should::not_be_null(&vals![true, true])?;
        should::be_a(&"Should", &["Should"])?;
        should::not_be_a(&"Should", &["Failure"])?;
        Ok(())
    })
}

#[cfg(any(test, feature = "demo-fail", debug_assertions))]
fn run_failing_tests() -> Result<(), Fatal> {
    should::execute_tests(|| {
        should::be_true(&[true, false])?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::OutputBuffer;

    #[test]
    fn the_sample_unit_passes_cleanly() {
        assert!(run_should_tests().is_ok());
    }

    #[test]
    fn the_failing_unit_reports_a_frame_but_no_fatal() {
        // Run the same batch through a capturing sink.
        let mut sink = OutputBuffer::new();
        let outcome = should::execute_tests_to(&mut sink, || {
            should::be_true(&[true, false])?;
            Ok(())
        });
        assert!(outcome.is_ok());
        assert!(sink.as_str().contains("[1] value is not true"));
    }

    #[test]
    fn default_units_are_registered() {
        register_default_units();
        assert!(discovery::registered_unit("should_tests").is_some());
        assert!(discovery::registered_unit("failing_tests").is_some());
    }
}
