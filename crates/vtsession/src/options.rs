use crate::error::SessionError;

/// Session open parameters, parsed from a `key=value,key=value,...`
/// string — the same flat grammar a caller would type on a command
/// line or store in an environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub save_lines: Option<u16>,
    pub font_name: Option<String>,
    pub font_size: Option<u16>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
    pub scroll_foreground_color: Option<String>,
    pub scroll_background_color: Option<String>,
    pub terminal_type: Option<String>,
    pub username: Option<String>,
    pub x_display_location: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
}

impl OpenOptions {
    /// Parse `key=value` pairs separated by commas. Whitespace around
    /// keys and values is trimmed; an unknown key is ignored rather
    /// than rejected, so options meant for one transport can be
    /// passed alongside options meant for another.
    pub fn parse(s: &str) -> Result<Self, SessionError> {
        let mut opts = OpenOptions::default();
        if s.trim().is_empty() {
            return Ok(opts);
        }
        let mut pos = 0;
        for pair in s.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                pos += 1;
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(SessionError::BadOption { pos });
            };
            let key = key.trim();
            let value = value.trim().to_string();
            match key {
                "width" => opts.width = value.parse().ok(),
                "height" => opts.height = value.parse().ok(),
                "save-lines" => opts.save_lines = value.parse().ok(),
                "font-name" => opts.font_name = Some(value),
                "font-size" => opts.font_size = value.parse().ok(),
                "foreground-color" => opts.foreground_color = Some(value),
                "background-color" => opts.background_color = Some(value),
                "scroll-foreground-color" => opts.scroll_foreground_color = Some(value),
                "scroll-background-color" => opts.scroll_background_color = Some(value),
                "terminal_type" => opts.terminal_type = Some(value),
                "username" => opts.username = Some(value),
                "x_display_location" => opts.x_display_location = Some(value),
                "hostname" => opts.hostname = Some(value),
                "port" => opts.port = value.parse().ok(),
                _ => tracing::debug!(key, "ignoring unrecognized session option"),
            }
            pos += pair.len() + 1;
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_keys() {
        let opts = OpenOptions::parse("width=80,height=24,save-lines=1000").unwrap();
        assert_eq!(opts.width, Some(80));
        assert_eq!(opts.height, Some(24));
        assert_eq!(opts.save_lines, Some(1000));
    }

    #[test]
    fn ignores_unknown_keys() {
        let opts = OpenOptions::parse("bogus=1,width=80").unwrap();
        assert_eq!(opts.width, Some(80));
    }

    #[test]
    fn rejects_pair_without_equals() {
        assert!(OpenOptions::parse("width").is_err());
    }

    #[test]
    fn empty_string_is_all_defaults() {
        assert_eq!(OpenOptions::parse("").unwrap(), OpenOptions::default());
    }

    #[test]
    fn telnet_specific_keys_parse() {
        let opts = OpenOptions::parse("terminal_type=xterm,username=guest").unwrap();
        assert_eq!(opts.terminal_type.as_deref(), Some("xterm"));
        assert_eq!(opts.username.as_deref(), Some("guest"));
    }
}
