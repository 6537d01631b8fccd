//! Available commands, autocomplete and parsing

use qa_deck::filter::{FilterKey, FilterOptions, QuickFilter, SortSpec};

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

impl Command {
  fn takes_args(&self) -> bool {
    !self.usage.is_empty()
  }
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "project",
    aliases: &["p", "proj"],
    usage: "[name]",
    description: "Filter by project",
  },
  Command {
    name: "portfolio",
    aliases: &["pf"],
    usage: "[name]",
    description: "Filter by portfolio",
  },
  Command {
    name: "tester",
    aliases: &["t"],
    usage: "[name]",
    description: "Filter by tester",
  },
  Command {
    name: "status",
    aliases: &["st"],
    usage: "[status]",
    description: "Filter by testing status",
  },
  Command {
    name: "sprint",
    aliases: &["sp"],
    usage: "[number]",
    description: "Filter by sprint",
  },
  Command {
    name: "from",
    aliases: &["since"],
    usage: "[yyyy-mm-dd]",
    description: "Reports on or after a date",
  },
  Command {
    name: "to",
    aliases: &["until"],
    usage: "[yyyy-mm-dd]",
    description: "Reports on or before a date",
  },
  Command {
    name: "sort",
    aliases: &["o", "order"],
    usage: "[field-dir]",
    description: "Sort by date, title, project or sprint",
  },
  Command {
    name: "quick",
    aliases: &["qf"],
    usage: "<preset>",
    description: "today, week, month, failed, recent",
  },
  Command {
    name: "clear",
    aliases: &["c", "reset"],
    usage: "",
    description: "Clear all filters",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "",
    description: "Refetch reports",
  },
  Command {
    name: "stats",
    aliases: &["s", "dashboard"],
    usage: "",
    description: "Show dashboard statistics",
  },
  Command {
    name: "delete",
    aliases: &["d", "rm"],
    usage: "[id]",
    description: "Delete a report (default: selected)",
  },
  Command {
    name: "add-portfolio",
    aliases: &["ap"],
    usage: "<name>",
    description: "Create a portfolio",
  },
  Command {
    name: "add-project",
    aliases: &["apr"],
    usage: "<name> [in <portfolio>]",
    description: "Create a project",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "",
    description: "Exit qa-deck",
  },
];

/// Sort keys offered for completion
pub const SORT_KEYS: &[&str] = &[
  "date-desc",
  "date-asc",
  "title-asc",
  "title-desc",
  "project-asc",
  "project-desc",
  "sprint-asc",
  "sprint-desc",
];

const QUICK_FILTERS: &[&str] = &["today", "week", "month", "failed", "recent"];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// One line of the autocomplete list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
  pub label: String,
  pub hint: String,
  /// Input text after accepting this suggestion
  pub completion: String,
  /// Accepting runs the command; otherwise the completion is left for editing
  pub submit: bool,
}

fn find_command(word: &str) -> Option<&'static Command> {
  let word = word.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == word || cmd.aliases.contains(&word.as_str()))
}

/// Suggestions for the command line: command names until a space is typed,
/// then known values for the command's argument.
pub fn suggestions(input: &str, options: &FilterOptions) -> Vec<Suggestion> {
  let Some((word, arg)) = input.split_once(' ') else {
    return get_suggestions(input)
      .into_iter()
      .map(|cmd| Suggestion {
        label: cmd.name.to_string(),
        hint: format!("{} {}", cmd.usage, cmd.description).trim().to_string(),
        completion: if cmd.takes_args() {
          format!("{} ", cmd.name)
        } else {
          cmd.name.to_string()
        },
        submit: !cmd.takes_args(),
      })
      .collect();
  };

  let arg = arg.trim_start();
  let Some(cmd) = find_command(word) else {
    return Vec::new();
  };
  if arg.is_empty() {
    return Vec::new();
  }

  let values: Vec<&str> = match cmd.name {
    "project" => options.projects.iter().map(String::as_str).collect(),
    "portfolio" => options.portfolios.iter().map(String::as_str).collect(),
    "tester" => options.testers.iter().map(String::as_str).collect(),
    "status" => options.statuses.iter().map(String::as_str).collect(),
    "sprint" => options.sprints.iter().map(String::as_str).collect(),
    "sort" => SORT_KEYS.to_vec(),
    "quick" => QUICK_FILTERS.to_vec(),
    _ => Vec::new(),
  };

  let needle = arg.to_lowercase();
  let mut matching: Vec<&str> = values
    .into_iter()
    .filter(|v| v.to_lowercase().contains(&needle))
    .collect();
  // Exact and prefix matches first
  matching.sort_by_key(|v| {
    let v = v.to_lowercase();
    (v != needle, !v.starts_with(&needle))
  });

  matching
    .into_iter()
    .map(|value| Suggestion {
      label: value.to_string(),
      hint: cmd.name.to_string(),
      completion: format!("{} {}", cmd.name, value),
      submit: true,
    })
    .collect()
}

/// What a submitted command asks the app to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  SetFilter(FilterKey, String),
  RemoveFilter(FilterKey),
  Quick(QuickFilter),
  ClearFilters,
  Refresh,
  Stats,
  /// Delete a report; `None` means the selected one
  Delete(Option<String>),
  AddPortfolio(String),
  AddProject {
    name: String,
    portfolio: Option<String>,
  },
  Quit,
}

/// Parse a submitted command line
pub fn parse(input: &str) -> Result<Action, String> {
  let input = input.trim();
  let (word, arg) = input.split_once(' ').unwrap_or((input, ""));
  let arg = arg.trim();

  let cmd = find_command(word).ok_or_else(|| format!("Unknown command: {}", word))?;

  let filter_key = match cmd.name {
    "project" => Some(FilterKey::Project),
    "portfolio" => Some(FilterKey::Portfolio),
    "tester" => Some(FilterKey::Tester),
    "status" => Some(FilterKey::Status),
    "sprint" => Some(FilterKey::Sprint),
    "from" => Some(FilterKey::DateFrom),
    "to" => Some(FilterKey::DateTo),
    _ => None,
  };
  if let Some(key) = filter_key {
    return Ok(if arg.is_empty() {
      Action::RemoveFilter(key)
    } else {
      Action::SetFilter(key, arg.to_string())
    });
  }

  match cmd.name {
    "sort" if arg.is_empty() => Ok(Action::RemoveFilter(FilterKey::Sort)),
    "sort" => {
      let spec: SortSpec = arg.parse()?;
      Ok(Action::SetFilter(FilterKey::Sort, spec.to_string()))
    }
    "quick" => arg.parse().map(Action::Quick),
    "clear" => Ok(Action::ClearFilters),
    "refresh" => Ok(Action::Refresh),
    "stats" => Ok(Action::Stats),
    "delete" => Ok(Action::Delete((!arg.is_empty()).then(|| arg.to_string()))),
    "add-portfolio" if arg.is_empty() => Err("Usage: add-portfolio <name>".to_string()),
    "add-portfolio" => Ok(Action::AddPortfolio(arg.to_string())),
    "add-project" => {
      let (name, portfolio) = match arg.rsplit_once(" in ") {
        Some((name, portfolio)) => (name.trim(), Some(portfolio.trim().to_string())),
        None => (arg, None),
      };
      if name.is_empty() {
        return Err("Usage: add-project <name> [in <portfolio>]".to_string());
      }
      Ok(Action::AddProject {
        name: name.to_string(),
        portfolio: portfolio.filter(|p| !p.is_empty()),
      })
    }
    "quit" => Ok(Action::Quit),
    other => Err(format!("Unknown command: {}", other)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options() -> FilterOptions {
    FilterOptions {
      projects: vec!["Alpha".into(), "Alpha Two".into(), "Beta".into()],
      statuses: vec!["failed".into(), "passed".into()],
      ..Default::default()
    }
  }

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("project");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "project");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("r");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("add-po");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "add-portfolio");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("ash");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "stats");
  }

  #[test]
  fn test_command_suggestions_complete_names() {
    let project = suggestions("proj", &options());
    assert_eq!(project[0].completion, "project ");
    assert!(!project[0].submit);

    let quit = suggestions("qui", &options());
    assert_eq!(quit[0].completion, "quit");
    assert!(quit[0].submit);
  }

  #[test]
  fn test_value_suggestions() {
    let values = suggestions("project alpha", &options());
    let labels: Vec<&str> = values.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Alpha", "Alpha Two"]);
    assert_eq!(values[0].completion, "project Alpha");

    let sorts = suggestions("sort title", &options());
    assert_eq!(sorts.len(), 2);

    assert!(suggestions("project ", &options()).is_empty());
    assert!(suggestions("nope x", &options()).is_empty());
  }

  #[test]
  fn test_parse_filters() {
    assert_eq!(
      parse("project Alpha Two"),
      Ok(Action::SetFilter(FilterKey::Project, "Alpha Two".into()))
    );
    assert_eq!(parse("project"), Ok(Action::RemoveFilter(FilterKey::Project)));
    assert_eq!(
      parse("from 2024-01-01"),
      Ok(Action::SetFilter(FilterKey::DateFrom, "2024-01-01".into()))
    );
    assert_eq!(
      parse("sort TITLE-ASC"),
      Ok(Action::SetFilter(FilterKey::Sort, "title-asc".into()))
    );
    assert!(parse("sort sideways").is_err());
    assert_eq!(parse("quick week"), Ok(Action::Quick(QuickFilter::Week)));
    assert!(parse("quick never").is_err());
  }

  #[test]
  fn test_parse_mutations() {
    assert_eq!(parse("delete"), Ok(Action::Delete(None)));
    assert_eq!(parse("rm 42"), Ok(Action::Delete(Some("42".into()))));
    assert_eq!(parse("add-portfolio Core"), Ok(Action::AddPortfolio("Core".into())));
    assert!(parse("add-portfolio").is_err());
    assert_eq!(
      parse("add-project Checkout in Web Apps"),
      Ok(Action::AddProject {
        name: "Checkout".into(),
        portfolio: Some("Web Apps".into()),
      })
    );
    assert_eq!(
      parse("add-project Checkout"),
      Ok(Action::AddProject {
        name: "Checkout".into(),
        portfolio: None,
      })
    );
  }

  #[test]
  fn test_parse_unknown() {
    assert!(parse("frobnicate").is_err());
    assert_eq!(parse("q"), Ok(Action::Quit));
  }
}
