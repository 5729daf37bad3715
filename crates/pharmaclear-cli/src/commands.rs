// Line-oriented commands read from the terminal

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    History,
    Rerun(i64),
    Watch(String),
    Unwatch(i64),
    Watchlist,
    Ask(String),
    Bell,
    Report,
    View,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  search <query>     search recall alerts
  history            list past searches
  rerun <id>         re-run a past search
  watch <query>      save a query to the watchlist
  unwatch <id>       remove a watchlist item
  watchlist          list saved queries
  ask <question>     ask about the current results
  bell               open or close notifications
  report             save a PDF report of the current results
  view               print the whole dashboard as JSON
  help               show this message
  quit               end the session";

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "search" => Command::Search(required_text(verb, rest)?),
            "history" => Command::History,
            "rerun" => Command::Rerun(required_id(verb, rest)?),
            "watch" => Command::Watch(required_text(verb, rest)?),
            "unwatch" => Command::Unwatch(required_id(verb, rest)?),
            "watchlist" => Command::Watchlist,
            "ask" => Command::Ask(required_text(verb, rest)?),
            "bell" => Command::Bell,
            "report" => Command::Report,
            "view" => Command::View,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };

        Ok(Some(command))
    }
}

fn required_text(verb: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {} <text>", verb))
    } else {
        Ok(rest.to_string())
    }
}

fn required_id(verb: &str, rest: &str) -> Result<i64, String> {
    rest.parse()
        .map_err(|_| format!("usage: {} <id>", verb))
}
