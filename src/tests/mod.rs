//! Cross-module test suite: curve engine properties and the fetch → engine → render
//! pipeline. Module-local behaviour is tested next to the code.

mod pipeline_tests;
