//! Ordered class colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest number of classes a `u8` label mask can address.
pub const MAX_CLASSES: usize = 256;

/// Ordered list of RGB colors; the color at index `i` belongs to class `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[u8; 3]>", into = "Vec<[u8; 3]>")]
pub struct Colormap {
    colors: Vec<[u8; 3]>,
}

impl Colormap {
    /// Create a colormap from RGB triplets.
    ///
    /// # Errors
    ///
    /// Returns an error if `colors` is empty or longer than [`MAX_CLASSES`].
    pub fn new(colors: Vec<[u8; 3]>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::InvalidColormap {
                reason: "at least one color is required".to_string(),
            });
        }

        if colors.len() > MAX_CLASSES {
            return Err(Error::InvalidColormap {
                reason: format!("{} colors exceed the {MAX_CLASSES} class limit", colors.len()),
            });
        }

        Ok(Self { colors })
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; an empty colormap cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color of class `label`, if the class exists.
    #[must_use]
    pub fn get(&self, label: usize) -> Option<[u8; 3]> {
        self.colors.get(label).copied()
    }

    /// All colors in class order.
    #[must_use]
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// Class of an RGB color. When several classes share a color the last one wins.
    #[must_use]
    pub fn label_of(&self, color: [u8; 3]) -> Option<u8> {
        self.colors
            .iter()
            .rposition(|candidate| *candidate == color)
            .and_then(|index| u8::try_from(index).ok())
    }
}

impl TryFrom<Vec<[u8; 3]>> for Colormap {
    type Error = Error;

    fn try_from(colors: Vec<[u8; 3]>) -> Result<Self> {
        Self::new(colors)
    }
}

impl From<Colormap> for Vec<[u8; 3]> {
    fn from(colormap: Colormap) -> Self {
        colormap.colors
    }
}

/// Parses `"r,g,b;r,g,b;..."`. Whitespace and a trailing `;` are ignored.
impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let colors = s
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(parse_color)
            .collect::<Result<Vec<_>>>()?;

        Self::new(colors)
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, [r, g, b]) in self.colors.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{r},{g},{b}")?;
        }
        Ok(())
    }
}

fn parse_color(entry: &str) -> Result<[u8; 3]> {
    let invalid = || Error::InvalidColormap {
        reason: format!("expected `r,g,b` with values 0-255, got `{entry}`"),
    };

    let channels = entry
        .split(',')
        .map(|channel| channel.trim().parse::<u8>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;

    <[u8; 3]>::try_from(channels).map_err(|_| invalid())
}
