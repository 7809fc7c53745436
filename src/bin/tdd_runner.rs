// Attest marker-driven runner: scans a directory tree and executes the
// test unit of every source file carrying the /* TDD */ opt-in marker.
// Usage: tdd_runner <path>

fn main() {
    attest::cli::run();
}
