//! Local scoring: payload normalisation, structural comparison and the
//! tool-call scorer, plus the `Scorer` abstraction every scorer implements.

mod case;
mod compare;
mod diagnostics;
mod normalize;
mod tool_call;
mod traits;

pub use case::{ScoringContext, TestCase};
pub use compare::{
    compare, parse_payload, try_compare, ComparisonMode, ContainmentComparator,
    ExactMatchComparator, PayloadComparator,
};
pub use diagnostics::{DiagnosticsSink, FailureRecord, FileDiagnostics};
pub use normalize::{
    extract_payload, has_payload, normalize_response, TOOL_CALL_CLOSE, TOOL_CALL_OPEN,
};
pub use tool_call::ToolCallScorer;
pub use traits::Scorer;
