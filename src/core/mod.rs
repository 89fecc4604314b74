pub mod aligner;
pub mod ledger;
pub mod pipeline;
pub mod trace;

pub use aligner::{align, AlignedLog, AlignedTest};
pub use ledger::{load_execution_windows, ExecutionWindow, TestId};
pub use pipeline::{Pipeline, PipelinePaths, RunSummary};
pub use trace::{assemble_traces, write_trace_file, Trace};
