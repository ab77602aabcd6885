// appstrap - core/mod.rs
//
// The filtering handler and its vocabulary: record model, matchers,
// rule slots, the evaluation engine, and the tracing bridge.

pub mod handler;
pub mod layer;
pub mod matcher;
pub mod record;
pub mod rules;
