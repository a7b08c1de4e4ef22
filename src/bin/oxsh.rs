// This file is part of oxsh, a POSIX-compatible command shell.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Reads shell source from standard input and parses it, reporting any
//! syntax error to standard error in the documented `<progname>: <message>
//! at line <N>` format.
//!
//! This binary takes no positional arguments; it exists to drive the parsing
//! core against a real input stream, not to run anything it parses.

use oxsh_syntax::context::{ParseOptions, ParserContext};
use oxsh_syntax::error::StderrWarningSink;
use oxsh_syntax::ringbuf::RingBuffer;
use std::io;
use std::process::ExitCode;

fn progname(argv0: &str) -> &str {
    argv0.rsplit('/').next().unwrap_or(argv0)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        eprintln!("{}: no arguments expected", progname(&args[0]));
        return ExitCode::from(1);
    }

    let argv0 = args.first().map(String::as_str).unwrap_or("oxsh");
    let name = progname(argv0);
    let options = ParseOptions {
        posix_mode: name == "sh",
        login_shell: argv0.starts_with('-'),
        tty_input: io::IsTerminal::is_terminal(&io::stdin()),
        do_not_run: false,
    };

    let mut ctx = ParserContext::new(options);
    let mut warnings = StderrWarningSink { progname: name };
    let mut ring = RingBuffer::new(io::stdin().lock());

    match ring.drive(&mut ctx, &mut warnings) {
        Ok(_statements) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.to_diagnostic(name));
            ExitCode::from(2)
        }
    }
}
