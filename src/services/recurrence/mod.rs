//! Recurrence-rule codec: parse, serialize, infer, and describe.
//!
//! Rules travel as semicolon-delimited `KEY=VALUE` strings in the common
//! calendar-interchange grammar (FREQ, INTERVAL, BYDAY, BYMONTHDAY,
//! BYMONTH, UNTIL, COUNT). The structured form is
//! [`crate::models::recurrence::RecurrenceSpec`].

mod describe;
mod infer;
mod parser;

pub use describe::describe_rule;
pub use infer::infer_rule;
pub use parser::{parse_rule, serialize_rule};
