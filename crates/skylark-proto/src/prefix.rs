//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick!user@host` mask.

use std::fmt;

/// IRC message prefix - identifies the origin of a message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// Server name (e.g., "irc.example.com").
    ServerName(String),
    /// User origin parsed from `nick!user@host`.
    User {
        /// Nickname.
        nick: String,
        /// Username (ident); empty when the mask carried none.
        user: String,
        /// Hostname; empty when the mask carried none.
        host: String,
    },
}

impl Prefix {
    /// Parse a prefix string leniently, without validating the components.
    ///
    /// Anything with a `!` or `@` is a user mask. A bare token containing a
    /// dot is taken as a server name; any other bare token as a nick.
    pub fn parse(s: &str) -> Self {
        let (nick, rest) = match s.split_once('!') {
            Some((nick, rest)) => (nick, Some(rest)),
            None => match s.split_once('@') {
                // nick@host without an ident
                Some((nick, host)) => {
                    return Prefix::User {
                        nick: nick.to_string(),
                        user: String::new(),
                        host: host.to_string(),
                    };
                }
                None if s.contains('.') => return Prefix::ServerName(s.to_string()),
                None => (s, None),
            },
        };

        match rest {
            Some(rest) => {
                let (user, host) = rest.split_once('@').unwrap_or((rest, ""));
                Prefix::User {
                    nick: nick.to_string(),
                    user: user.to_string(),
                    host: host.to_string(),
                }
            }
            None => Prefix::User {
                nick: nick.to_string(),
                user: String::new(),
                host: String::new(),
            },
        }
    }

    /// The nickname, when this prefix is a user mask.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::ServerName(_) => None,
            Prefix::User { nick, .. } => Some(nick),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => write!(f, "{}", name),
            Prefix::User { nick, user, host } => {
                write!(f, "{}", nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_mask() {
        let prefix = Prefix::parse("nick!user@host.example.com");
        assert_eq!(
            prefix,
            Prefix::User {
                nick: "nick".to_string(),
                user: "user".to_string(),
                host: "host.example.com".to_string(),
            }
        );
        assert_eq!(prefix.nick(), Some("nick"));
    }

    #[test]
    fn parse_server_name() {
        let prefix = Prefix::parse("irc.example.com");
        assert_eq!(prefix, Prefix::ServerName("irc.example.com".to_string()));
        assert_eq!(prefix.nick(), None);
    }

    #[test]
    fn parse_bare_nick() {
        let prefix = Prefix::parse("services");
        assert_eq!(prefix.nick(), Some("services"));
    }

    #[test]
    fn parse_nick_at_host() {
        let prefix = Prefix::parse("nick@host");
        assert_eq!(
            prefix,
            Prefix::User {
                nick: "nick".to_string(),
                user: String::new(),
                host: "host".to_string(),
            }
        );
    }

    #[test]
    fn display_round_trip() {
        for raw in ["nick!user@host", "irc.example.com", "nick"] {
            assert_eq!(Prefix::parse(raw).to_string(), raw);
        }
    }
}
