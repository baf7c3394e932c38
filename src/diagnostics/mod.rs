//! Export diagnostics
//!
//! Tells the user which clipboard strategies can work on this host.


pub use self_test::{
    DiagnosticReport, SelfTestHarness, TestResult, CHECK_API_SUPPORT, CHECK_COPY,
    CHECK_PERMISSIONS, CHECK_SECURE_CONTEXT,
};
