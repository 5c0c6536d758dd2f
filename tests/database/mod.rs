mod loader_tests;
pub mod test_helpers;
