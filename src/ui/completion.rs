//! Shell completion system for linkrot

use clap::{Command, CommandFactory};
use clap_complete::{Generator, Shell, generate};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{LinkrotError, Result};
use crate::ui::cli::Cli;

const BIN_NAME: &str = "linkrot";

/// Generate shell completions for the given shell
pub fn print_completions<G: Generator>(generator: G, app: &mut Command) {
    generate(
        generator,
        app,
        app.get_name().to_string(),
        &mut std::io::stdout(),
    );
}

/// Install shell completion to the standard location under `$HOME`
pub fn install_completion(shell: Shell) -> Result<String> {
    let home = std::env::var_os("HOME").ok_or_else(|| {
        LinkrotError::Config("HOME environment variable not set".to_string())
    })?;
    install_completion_in(shell, Path::new(&home))
}

/// Install shell completion below `home` and return setup instructions
pub fn install_completion_in(shell: Shell, home: &Path) -> Result<String> {
    let completion_dir = completion_directory(shell, home)?;
    let completion_path = completion_dir.join(completion_filename(shell));

    let completion_script = generate_completion_script(shell)?;
    fs::write(&completion_path, completion_script)?;

    let instructions = shell_setup_instructions(shell, &completion_path);
    Ok(format!(
        "✅ Shell completion installed successfully!\n\n{instructions}"
    ))
}

/// Standard completion directory for a shell, created if missing
fn completion_directory(shell: Shell, home: &Path) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = match shell {
        Shell::Bash => vec![
            home.join(".local/share/bash-completion/completions"),
            home.join(".bash_completion.d"),
        ],
        Shell::Zsh => vec![
            home.join(".local/share/zsh/site-functions"),
            home.join(".zsh/completions"),
        ],
        Shell::Fish => vec![home.join(".config/fish/completions")],
        Shell::PowerShell | Shell::Elvish => {
            return Err(LinkrotError::InvalidArgument(format!(
                "{shell} completion installation not supported. Use '{BIN_NAME} completion-generate {shell}' and add the output to your profile manually."
            )));
        }
        _ => {
            return Err(LinkrotError::InvalidArgument(format!(
                "Unsupported shell: {shell}"
            )));
        }
    };

    // Prefer a location whose parent already exists; otherwise the first one
    let chosen = candidates
        .iter()
        .find(|path| path.parent().is_some_and(Path::exists))
        .unwrap_or(&candidates[0])
        .clone();
    fs::create_dir_all(&chosen)?;
    Ok(chosen)
}

fn completion_filename(shell: Shell) -> &'static str {
    match shell {
        Shell::Zsh => "_linkrot",
        Shell::Fish => "linkrot.fish",
        _ => BIN_NAME,
    }
}

fn generate_completion_script(shell: Shell) -> Result<String> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buf);

    String::from_utf8(buf).map_err(|e| {
        LinkrotError::InvalidArgument(format!("Failed to generate completion script: {e}"))
    })
}

fn shell_setup_instructions(shell: Shell, completion_path: &Path) -> String {
    match shell {
        Shell::Bash => format!(
            "Completion installed to: {}\n\n\
            To enable bash completions, add this to your ~/.bashrc:\n\
            source {}\n\n\
            Then restart your shell or run: source ~/.bashrc",
            completion_path.display(),
            completion_path.display()
        ),
        Shell::Zsh => format!(
            "Completion installed to: {}\n\n\
            To enable zsh completions, add this to your ~/.zshrc:\n\
            fpath=({} $fpath)\n\
            autoload -U compinit && compinit\n\n\
            You may also need to clear the completion cache: rm -f ~/.zcompdump*",
            completion_path.display(),
            completion_path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ),
        Shell::Fish => format!(
            "Completion installed to: {}\n\n\
            Fish loads completions from ~/.config/fish/completions/ automatically.",
            completion_path.display()
        ),
        _ => format!("Completion installed to: {}", completion_path.display()),
    }
}
