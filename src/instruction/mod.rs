//! Operator instruction handling
//!
//! Free text -> ParsedInstruction (watchlist rules + urgency), plus the
//! merge used by live sessions to stack instructions over time.

pub mod parser;

pub use parser::{
    instruction_matches_label, merge_instructions, parse_instruction, ParsedInstruction,
    WatchlistRule, MERGE_SEPARATOR,
};
