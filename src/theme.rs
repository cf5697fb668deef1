use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::fs;

/// Name of the preference file, holding `"dark"` or `"light"`.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn flipped(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Label for the mode toggle control: shows what pressing it switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow::anyhow!("unknown theme '{other}'")),
        }
    }
}

/// Reads the ambient color-scheme signal from the terminal environment.
/// `COLORFGBG` looks like `"15;0"` (foreground;background); a dark background
/// index means a dark scheme. Unset or unparsable means light.
pub fn ambient_theme() -> Theme {
    let Ok(value) = std::env::var("COLORFGBG") else {
        return Theme::Light;
    };

    match value.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()) {
        Some(bg) if bg <= 6 || bg == 8 => Theme::Dark,
        _ => Theme::Light,
    }
}

/// Persisted theme preference under the user's home directory.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn open() -> Result<Self> {
        Ok(ThemeStore {
            path: Self::get_path()?,
        })
    }

    /// Read the stored preference, falling back to the ambient signal when
    /// nothing valid is stored.
    pub async fn load(&self) -> Theme {
        match fs::read_to_string(&self.path).await {
            Ok(content) => content.parse().unwrap_or_else(|_| ambient_theme()),
            Err(_) => ambient_theme(),
        }
    }

    pub async fn save(&self, theme: Theme) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&self.path, theme.as_str()).await?;
        Ok(())
    }

    /// Flip the stored preference and return the new mode.
    pub async fn toggle(&self) -> Result<Theme> {
        let theme = self.load().await.flipped();
        self.save(theme).await?;
        Ok(theme)
    }

    fn get_path() -> Result<PathBuf> {
        #[cfg(test)]
        {
            if let Ok(test_home) = std::env::var("TASKTRACK_TEST_HOME") {
                return Ok(PathBuf::from(test_home).join(".tasktrack").join(THEME_KEY));
            }
        }

        let home = directories::UserDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?
            .home_dir()
            .to_path_buf();

        Ok(home.join(".tasktrack").join(THEME_KEY))
    }
}
