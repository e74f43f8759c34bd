//! Assertion-style halt: pretty-print values and terminate the process.
//!
//! This path bypasses normalization and the collector entirely; it is plain
//! `Debug` formatting to stdout followed by a non-zero exit.

use std::{
    borrow::Cow,
    fmt::{self, Write as _},
    io::Write as _,
    process,
};

use crate::defaults::{DUMP_EXIT_CODE, DUMP_PLACEHOLDER};

/// One value handed to [`dump_and_exit`], optionally named.
#[derive(Clone, Copy)]
pub struct DumpArg<'a> {
    name: Option<&'a str>,
    value: &'a dyn fmt::Debug,
}

impl fmt::Debug for DumpArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpArg")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<'a> DumpArg<'a> {
    pub fn new(value: &'a dyn fmt::Debug) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: &'a str, value: &'a dyn fmt::Debug) -> Self {
        Self {
            name: Some(name),
            value,
        }
    }

    fn label(&self, position: usize) -> Cow<'a, str> {
        match self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(position.to_string()),
        }
    }
}

/// Renders the dump text without printing it.
///
/// A single value is printed as-is; several values are each prefixed with
/// their name or 1-based position.
pub fn render_dump(args: &[DumpArg<'_>]) -> String {
    let mut out = String::new();
    match args {
        [] => out.push_str(DUMP_PLACEHOLDER),
        [single] => {
            let _ = write!(out, "{:#?}", single.value);
        }
        many => {
            for (index, arg) in many.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                let _ = write!(out, "{}: {:#?}", arg.label(index + 1), arg.value);
            }
        }
    }
    out.push('\n');
    out
}

/// Prints [`render_dump`] to stdout and exits with status 1.
pub fn dump_and_exit(args: &[DumpArg<'_>]) -> ! {
    let rendered = render_dump(args);
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(rendered.as_bytes());
    let _ = stdout.flush();
    process::exit(DUMP_EXIT_CODE)
}

/// Dumps the given values to stdout and terminates the process.
///
/// ```no_run
/// let order_id = 7;
/// dev_debug::dev_dump!(order_id, "status");
/// ```
///
/// Values may be named with `name = value`; unnamed values are labeled by
/// position when more than one is given.
#[macro_export]
macro_rules! dev_dump {
    () => {
        $crate::dump_and_exit(&[])
    };
    ($($name:ident = $value:expr),+ $(,)?) => {
        $crate::dump_and_exit(&[$($crate::DumpArg::named(stringify!($name), &$value)),+])
    };
    ($($value:expr),+ $(,)?) => {
        $crate::dump_and_exit(&[$($crate::DumpArg::new(&$value)),+])
    };
}
