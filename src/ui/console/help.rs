use crate::ui::command;
use command::parser;

pub const HELP: &str = r#"
Any input without a leading `.` is evaluated as an expression in the paused frame.

Available commands:

.reload                   -- re-read the paused source file and hot patch the running script
.snap [file]              -- serialize visible variables into a test fixture
.c, .continue             -- resume the program and exit
.whereami                 -- show source code around the pause location
.h, .help <>|<command>    -- show help
"#;

pub const HELP_RELOAD: &str = "\
\x1b[32;1m.reload\x1b[0m
Read the source file of the paused script from disk and replace the script source in the
running program. Functions already on the stack may keep their old code until they return.
";

pub const HELP_SNAP: &str = "\
\x1b[32;1m.snap\x1b[0m
Serialize every variable visible from the paused frame (global scope excluded) and write
a test file that declares them as constants. Cyclic references are replaced with a marker,
functions with a placeholder.

Examples of usage:
.snap - write into default file (see `snap-file` configuration)
.snap fixtures/user.test.js - write into selected file
";

pub const HELP_CONTINUE: &str = "\
\x1b[32;1mc, continue\x1b[0m
Resume the paused program and close the session. Ctrl+C and Ctrl+D do the same.
";

pub const HELP_WHEREAMI: &str = "\
\x1b[32;1mwhereami\x1b[0m
Show source lines around the pause location, current line is marked with `>`.
";

pub const HELP_HELP: &str = "\
\x1b[32;1mh, help\x1b[0m
Show list of commands or help for a single command.
";

pub fn help_for_command(command: Option<&str>) -> &str {
    match command.map(|c| c.trim_start_matches(parser::COMMAND_PREFIX)) {
        None => HELP,
        Some(parser::RELOAD_COMMAND) => HELP_RELOAD,
        Some(parser::SNAP_COMMAND) => HELP_SNAP,
        Some(parser::CONTINUE_COMMAND) | Some(parser::CONTINUE_COMMAND_SHORT) => HELP_CONTINUE,
        Some(parser::WHEREAMI_COMMAND) => HELP_WHEREAMI,
        Some(parser::HELP_COMMAND) | Some(parser::HELP_COMMAND_SHORT) => HELP_HELP,
        _ => "unknown command",
    }
}
