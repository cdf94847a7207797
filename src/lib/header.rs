//! `@PG` records for output headers.
//!
//! The output header is the input header plus one `@PG` line naming this program. Its
//! `PP` tag points at the last program of the existing chain, and its `ID` gets a `.1`,
//! `.2`, ... suffix when `samfilter` is already taken, as when a file is filtered twice.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::Program;
use noodles::sam::header::record::value::map::program::tag;
use std::collections::HashSet;

/// Program name and base `@PG` ID.
pub const PROGRAM_NAME: &str = "samfilter";

/// Returns the ID of the program at the end of the `@PG` chain: one that no other
/// program names in its `PP` tag.
#[must_use]
pub fn last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let programs = programs.as_ref();

    let referenced: HashSet<&[u8]> = programs
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(AsRef::as_ref)
        .collect();

    programs
        .keys()
        .rev()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| programs.keys().last())
        .map(|id| String::from_utf8_lossy(id).into_owned())
}

/// Returns `base_id`, or `base_id.N` for the smallest `N` not already used as an ID.
#[must_use]
pub fn unique_program_id(header: &Header, base_id: &str) -> String {
    let programs = header.programs();
    let programs = programs.as_ref();
    if !programs.contains_key(base_id.as_bytes()) {
        return base_id.to_string();
    }
    (1_u64..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|id| !programs.contains_key(id.as_bytes()))
        .unwrap_or_else(|| base_id.to_string())
}

/// Builds the `@PG` record with name, version, command line and optional `PP`.
///
/// # Errors
///
/// Returns an error if the record cannot be built.
pub fn program_record(
    version: &str,
    command_line: &str,
    previous_program: Option<&str>,
) -> Result<Map<Program>> {
    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_NAME)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(pp) = previous_program {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp);
    }
    Ok(builder.build()?)
}

/// Returns `header` with a `samfilter` `@PG` record chained after the existing ones.
///
/// # Errors
///
/// Returns an error if the record cannot be built or added.
pub fn add_pg_record(mut header: Header, version: &str, command_line: &str) -> Result<Header> {
    let previous = last_program_id(&header);
    let id = unique_program_id(&header, PROGRAM_NAME);
    let record = program_record(version, command_line, previous.as_deref())?;
    header.programs_mut().add(BString::from(id), record)?;
    Ok(header)
}
