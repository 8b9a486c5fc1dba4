pub const CMD_URL: &str = "url";
pub const CMD_SUBMIT: &str = "submit";
pub const CMD_CLONE: &str = "clone";
pub const CMD_SOURCE: &str = "source";
pub const CMD_PREVIEW: &str = "preview";
pub const CMD_DOWNLOAD: &str = "download";
pub const CMD_COPY: &str = "copy";
pub const CMD_HEALTH: &str = "health";
pub const CMD_HELP: &str = "help";
pub const CMD_QUIT: &str = "quit";

pub const RULE_WIDTH: usize = 72;

pub const HELP_TEXT: &str = "\
Commands:
  <url>            set the URL and clone it
  url <text>       set the URL without submitting
  submit           clone the current URL (also: an empty line)
  clone <url>      set the URL and clone it
  source           show or hide the generated HTML
  preview          open the clone in the browser
  download         save the clone as cloned-website.html
  copy             copy the generated HTML to the clipboard
  health           check whether the backend is reachable
  help             show this help
  quit             leave (also: exit, Ctrl-D)
";
