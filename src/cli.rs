use anyhow::Result;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Args {
    pub update: bool,
    pub assume_yes: bool,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        for arg in args {
            match arg.as_str() {
                "--update" | "-u" => parsed.update = true,
                "--yes" | "-y" => parsed.assume_yes = true,
                other => anyhow::bail!("Unknown argument: {} (expected --update, --yes)", other),
            }
        }
        Ok(parsed)
    }
}

pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags() {
        assert_eq!(Args::parse(args(&[])).unwrap(), Args::default());
        let parsed = Args::parse(args(&["--update", "-y"])).unwrap();
        assert!(parsed.update && parsed.assume_yes);
        assert!(Args::parse(args(&["--force"])).is_err());
    }

    #[test]
    fn confirm_accepts_only_yes() {
        let mut out = Vec::new();
        assert!(confirm("Download?", &mut Cursor::new("Y\n"), &mut out).unwrap());
        assert!(!confirm("Download?", &mut Cursor::new("\n"), &mut out).unwrap());
        assert!(!confirm("Download?", &mut Cursor::new("nope\n"), &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Download? [y/N] "));
    }
}
