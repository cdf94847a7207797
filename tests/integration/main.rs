//! End-to-end tests of the `samfilter` binary.

mod helpers;
mod test_error_paths;
mod test_filter_command;
