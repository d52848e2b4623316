//! Command implementations for the CLI tool.

use std::path::Path;

use rezip::{EditResult, MissingEntryPolicy, MutateOptions, UnpackOptions};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;

/// Where and how results are printed.
pub struct Output {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Output {
    fn print(&self, text: &str) {
        if !self.quiet {
            print!("{}", text);
        }
    }
}

/// Applies `--strict` to the missing-entry policy.
pub fn missing(options: MutateOptions, strict: bool) -> MutateOptions {
    if strict {
        options.on_missing(MissingEntryPolicy::Error)
    } else {
        options
    }
}

fn finish_edit(
    operation: &str,
    archive: &Path,
    result: rezip::Result<EditResult>,
    out: &Output,
) -> ExitCode {
    match result {
        Ok(result) => {
            let formatter = create_formatter(out.format);
            out.print(&formatter.format_edit_result(operation, archive, &result));
            ExitCode::Success
        }
        Err(e) => fail(&e),
    }
}

fn fail(error: &rezip::Error) -> ExitCode {
    eprintln!("Error: {}", error);
    error_to_exit_code(error)
}

/// Create command implementation
pub fn create(archive: &Path, file: &Path, options: &MutateOptions, out: &Output) -> ExitCode {
    let result = rezip::create_archive_with_options(archive, file, options);
    finish_edit("create", archive, result, out)
}

/// Add command implementation
pub fn add(archive: &Path, file: &Path, options: &MutateOptions, out: &Output) -> ExitCode {
    let result = rezip::add_file_with_options(archive, file, options);
    finish_edit("add", archive, result, out)
}

/// Remove command implementation
pub fn remove(archive: &Path, name: &str, options: &MutateOptions, out: &Output) -> ExitCode {
    let result = rezip::remove_file_with_options(archive, name, options);
    finish_edit("remove", archive, result, out)
}

/// Replace command implementation
pub fn replace(
    archive: &Path,
    name: &str,
    file: &Path,
    options: &MutateOptions,
    out: &Output,
) -> ExitCode {
    let result = rezip::replace_file_with_options(archive, name, file, options);
    finish_edit("replace", archive, result, out)
}

/// Unpack command implementation
pub fn unpack(archive: &Path, dest: &Path, options: &UnpackOptions, out: &Output) -> ExitCode {
    match rezip::unpack_with_options(archive, dest, options) {
        Ok(result) => {
            let formatter = create_formatter(out.format);
            out.print(&formatter.format_unpack_result(dest, &result));
            ExitCode::Success
        }
        Err(e) => fail(&e),
    }
}

/// List command implementation
pub fn list(archive: &Path, technical: bool, out: &Output) -> ExitCode {
    match rezip::list_entries(archive) {
        Ok(entries) => {
            let formatter = create_formatter(out.format);
            out.print(&formatter.format_list(&entries, technical));
            ExitCode::Success
        }
        Err(e) => fail(&e),
    }
}
