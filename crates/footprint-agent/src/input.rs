//! Line protocol read from stdin.
//!
//! ```text
//! /shop                 navigate to /shop
//! /shop<TAB>Shop        navigate to /shop, then set the title to "Shop"
//! @signin user-42       mark user-42 as signed in
//! @signout              sign out
//! # comment             ignored, as are blank lines
//! ```

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A route change, with the title the host sets afterwards.
    Navigate {
        /// Path of the new route.
        pathname: String,
        /// Document title, if given.
        title: Option<String>,
    },
    /// A user signed in.
    SignIn(String),
    /// The user signed out.
    SignOut,
}

/// Parse one line. Returns `None` for blank lines, comments, and lines
/// that are not recognized.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if let Some(rest) = line.strip_prefix('@') {
        let mut words = rest.split_whitespace();
        return match (words.next(), words.next()) {
            (Some("signin"), Some(user_id)) => Some(Command::SignIn(user_id.to_owned())),
            (Some("signout"), None) => Some(Command::SignOut),
            _ => None,
        };
    }

    if !line.starts_with('/') {
        return None;
    }

    let (pathname, title) = match line.split_once('\t') {
        Some((path, title)) => (path.trim(), Some(title.trim().to_owned())),
        None => (line, None),
    };
    Some(Command::Navigate {
        pathname: pathname.to_owned(),
        title: title.filter(|t| !t.is_empty()),
    })
}
