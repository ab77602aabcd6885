// appstrap - lib.rs
//
// Application bootstrap helpers: a CLI argument layer, configuration
// loading, logging setup, and a generic `run()` entry point -- plus the
// filtering log handler (`DebugLogger`) that makes debug-time log
// surgery possible without touching committed configuration.
//
// Typical use:
//
// ```no_run
// use appstrap::app::entry::{run, AppContext, AppInfo};
//
// fn main() {
//     let info = AppInfo {
//         name: "demo",
//         version: env!("CARGO_PKG_VERSION"),
//         stage: "",
//         author: "Swatto",
//         description: "Demo application",
//         url: "https://github.com/swatto86/appstrap",
//     };
//     let code = run(info, |cmd| cmd, |_ctx: &AppContext| Ok::<_, std::convert::Infallible>(0));
//     std::process::exit(code);
// }
// ```

pub mod app;
pub mod core;
pub mod util;

pub use crate::app::entry::{run, run_from, AppContext, AppInfo, IntoExitCode};
pub use crate::core::handler::{ConsoleSink, DebugLogger, Decision, FileSink, Sink};
pub use crate::core::layer::DebugLayer;
pub use crate::core::matcher::{Interval, Matcher};
pub use crate::core::record::{FilterField, Record, Severity};
pub use crate::core::rules::{RuleSet, Verdict};
