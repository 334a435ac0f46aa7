#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Small helpers shared by restkit services.
//!
//! Layout: `datetime.rs` (epoch conversions), `random.rs` (token generation),
//! `diff.rs` (field-level change tracking over JSON objects), `pagination.rs`
//! (page slicing and result envelopes), `rounding.rs` (ceil and money rounding).

pub mod datetime;
pub mod diff;
pub mod pagination;
pub mod random;
pub mod rounding;

pub use datetime::{
    date_to_datetime, datetime_to_utc_unix, datetime_to_utc_unix_ms, utc_unix_ms_to_datetime,
};
pub use diff::{
    Changes, Diff, FieldChange, apply_changes, diff, get_diff, make_change_message, update_data,
    valid_fields,
};
pub use pagination::{AdminPage, CursorPage, DEFAULT_PAGE_SIZE, Page, Paginator, admin_page, cursor_page};
pub use random::{RANDOM_CHARACTER_SET, RANDOM_DIGIT_SET, random_digit, random_string};
pub use rounding::{money_round_up, round_up};
