#![allow(dead_code)]

use std::error::Error;

pub use dagrun_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;
