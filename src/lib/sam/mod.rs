//! SAM header inspection and test-record utilities.
//!
//! - [`builder`] - fluent construction of test records and SAM/BAM files
//! - [`sort_order`] - the `SO` value of a header, used to warn about inputs that make
//!   template-level filtering buffer many records

pub mod builder;

pub use builder::{FragBuilder, PairBuilder, SamBuilder, Strand, parse_cigar};

use std::path::Path;

use log::warn;
use noodles::sam::Header;
use noodles::sam::header::record::value::map::header::sort_order::COORDINATE;

/// Returns the `SO` (sort order) value of the `@HD` line, if any.
#[must_use]
pub fn sort_order(header: &Header) -> Option<String> {
    let hd = header.header()?;
    hd.other_fields()
        .get(b"SO")
        .map(|so| String::from_utf8_lossy(<_ as AsRef<[u8]>>::as_ref(so)).into_owned())
}

/// True if the header declares coordinate order.
#[must_use]
pub fn is_coordinate_sorted(header: &Header) -> bool {
    sort_order(header).is_some_and(|so| so.as_bytes() == COORDINATE)
}

/// Warns that mates of a coordinate-sorted input may be far apart, in which case every
/// record between them is held in memory until the second mate arrives.
pub fn warn_if_coordinate_sorted(header: &Header, path: &Path) {
    if is_coordinate_sorted(header) {
        warn!(
            "Input {} is coordinate sorted; mates far apart are buffered until both are seen.",
            path.display()
        );
        warn!("Queryname-sorted or grouped input keeps memory use low.");
    }
}
