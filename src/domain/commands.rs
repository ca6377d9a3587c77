use anyhow::{anyhow, Result};

/// Playlist positions in slash commands are 1-based; parsing converts them to
/// 0-based indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Add(String),
    Play(Option<usize>),
    Pause,
    Stop,
    Next,
    Previous,
    Volume(i64),
    Remove(usize),
    Clear,
    Download(String),
    Quit,
    Help,
}

impl SlashCommand {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Err(anyhow!("slash commands must start with '/'"));
        }

        let body = trimmed[1..].trim_start();
        let (cmd, rest) = match body.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (body, ""),
        };
        if cmd.is_empty() {
            return Err(anyhow!("empty command"));
        }

        match cmd {
            "add" => {
                if rest.is_empty() {
                    Err(anyhow!("usage: /add <path>"))
                } else {
                    Ok(Self::Add(rest.to_string()))
                }
            }
            "play" => {
                if rest.is_empty() {
                    Ok(Self::Play(None))
                } else {
                    Ok(Self::Play(Some(parse_position(rest, "play")?)))
                }
            }
            "pause" => Ok(Self::Pause),
            "stop" => Ok(Self::Stop),
            "next" | "n" => Ok(Self::Next),
            "prev" | "previous" | "p" => Ok(Self::Previous),
            "volume" | "vol" => {
                let value = rest
                    .parse::<i64>()
                    .map_err(|_| anyhow!("usage: /volume <0-100>"))?;
                Ok(Self::Volume(value))
            }
            "remove" | "rm" => {
                if rest.is_empty() {
                    return Err(anyhow!("usage: /remove <n>"));
                }
                Ok(Self::Remove(parse_position(rest, "remove")?))
            }
            "clear" => Ok(Self::Clear),
            "download" | "dl" => {
                if rest.is_empty() {
                    Err(anyhow!("usage: /download <url>"))
                } else {
                    Ok(Self::Download(rest.to_string()))
                }
            }
            "quit" | "q" => Ok(Self::Quit),
            "help" => Ok(Self::Help),
            _ => Err(anyhow!("unknown command: {cmd}")),
        }
    }
}

fn parse_position(value: &str, cmd: &str) -> Result<usize> {
    let position = value
        .parse::<usize>()
        .map_err(|_| anyhow!("{cmd} index must be a number"))?;
    if position == 0 {
        return Err(anyhow!("{cmd} index must be >= 1"));
    }
    Ok(position - 1)
}
