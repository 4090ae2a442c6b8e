//! Shared benchmark scaffolding used by the criterion benches and the
//! comparison report.
//!
//! Both sides derive case names from the same declarations here, so a report
//! always reads the cases the benches actually produced.

pub mod scenarios;
