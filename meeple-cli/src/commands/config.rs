use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use meeple_bgg::{BggConfig, ConfigSource};

use crate::CliError;

fn mask_value(s: &str) -> String {
    let head: String = s.chars().take(2).collect();
    if s.chars().count() <= 2 {
        "****".to_string()
    } else {
        format!("{}****", head)
    }
}

/// Show resolved client settings and where each one came from.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let path = meeple_bgg::config_path();

    println!(
        "{}",
        "BoardGameGeek Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    println!();

    match &path {
        Some(p) if p.exists() => println!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        ),
        Some(p) => println!(
            "  Config file: {} {}",
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => println!(
            "  Config file: {}",
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
    println!();

    let (config, sources) = BggConfig::load()?;

    let token = config.api_token.as_deref().map(mask_value);
    let max_candidates = config.max_candidates.map(|n| n.to_string());
    let rows: [(&str, Option<String>, &ConfigSource); 4] = [
        ("base_url", Some(config.base_url.clone()), &sources.base_url),
        ("api_token", token, &sources.api_token),
        (
            "timeout_secs",
            Some(config.timeout_secs.to_string()),
            &sources.timeout_secs,
        ),
        ("max_candidates", max_candidates, &sources.max_candidates),
    ];

    for (name, value, source) in rows {
        match value {
            Some(v) => println!(
                "  {:<16} {:<40} {}",
                name,
                v,
                format!("({})", source).if_supports_color(Stdout, |t| t.dimmed()),
            ),
            None => println!(
                "  {:<16} {}",
                name,
                "not set".if_supports_color(Stdout, |t| t.yellow()),
            ),
        }
    }

    if config.api_token.is_none() {
        println!();
        println!("  Requests are sent without an API token.");
        println!("  Run 'meeple config set-token <token>' to store one.");
    }
    Ok(())
}

pub(crate) fn run_config_path() -> Result<(), CliError> {
    match meeple_bgg::config_path() {
        Some(p) => {
            println!("{}", p.display());
            Ok(())
        }
        None => Err(CliError::not_found("Could not determine config directory")),
    }
}

pub(crate) fn run_config_set_token(token: &str) -> Result<(), CliError> {
    let Some(path) = meeple_bgg::config_path() else {
        return Err(CliError::not_found("Could not determine config directory"));
    };
    meeple_bgg::save_token(&path, token.trim())?;
    println!(
        "{} token to {}",
        "Saved".if_supports_color(Stdout, |t| t.green()),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_value_hides_all_but_prefix() {
        assert_eq!(mask_value("abcdef"), "ab****");
        assert_eq!(mask_value("ab"), "****");
        assert_eq!(mask_value(""), "****");
    }
}
