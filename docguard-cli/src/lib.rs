// The adoption engine lives in docguard-core.
// This crate only adds the `docguard` command line front end.

pub use docguard_core::*;
