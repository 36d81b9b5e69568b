pub mod determinism_tests;
pub mod concurrency_tests;
