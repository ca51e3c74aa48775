#![forbid(unsafe_code)]

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use rcterm_collections::TableConfig;
use rcterm_number::class_for_entries;
use rcterm_utilities::RcTermError;

/// The largest size class, ids are 32 bits and the tables must be addressable by them.
pub const MAX_ADDRESSABLE_SIZE_CLASS: u32 = 31;

/// Parameters of a [crate::TermStore].
///
/// The defaults give a symbol table of 16K entries and a term table of 128K
/// entries, which typical inputs never need to grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// The initial capacity of the symbol table is `2^symbol_size_class`.
    pub symbol_size_class: u32,
    /// The initial capacity of the term table is `2^term_size_class`.
    pub term_size_class: u32,
    /// Percentage of the capacity that may be occupied before a table grows.
    pub max_load_percent: u8,
    /// No table grows beyond a capacity of `2^max_size_class`.
    pub max_size_class: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            symbol_size_class: 14,
            term_size_class: 17,
            max_load_percent: 80,
            max_size_class: MAX_ADDRESSABLE_SIZE_CLASS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the {field} {value} exceeds the maximum size class {max}")]
    SizeClassTooLarge { field: &'static str, value: u32, max: u32 },

    #[error("the maximum size class {0} exceeds 31, the largest class addressable by 32-bit ids")]
    MaxSizeClassTooLarge(u32),

    #[error("the maximum load of {0}% is not between 1% and 100%")]
    InvalidLoad(u8),

    #[error("invalid store configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl StoreConfig {
    /// Parses a configuration from a TOML document, keys that are absent take their default value.
    ///
    /// # Examples
    ///
    /// ```
    /// use rcterm_store::StoreConfig;
    ///
    /// let config = StoreConfig::from_toml_str("term_size_class = 20").unwrap();
    /// assert_eq!(config.term_size_class, 20);
    /// assert_eq!(config.symbol_size_class, 14);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<StoreConfig, ConfigError> {
        let config: StoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default configuration with initial tables large enough to
    /// hold the given number of symbols and terms without growing.
    pub fn for_capacities(symbols: usize, terms: usize) -> StoreConfig {
        let defaults = StoreConfig::default();
        let class_for_load = |entries: usize| {
            class_for_entries(entries.saturating_mul(100) / defaults.max_load_percent as usize + 1)
        };

        StoreConfig {
            symbol_size_class: class_for_load(symbols),
            term_size_class: class_for_load(terms),
            ..defaults
        }
    }

    /// Reads a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<StoreConfig, RcTermError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&text)?)
    }

    /// Checks that the configuration describes tables that can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size_class > MAX_ADDRESSABLE_SIZE_CLASS {
            return Err(ConfigError::MaxSizeClassTooLarge(self.max_size_class));
        }

        if !(1..=100).contains(&self.max_load_percent) {
            return Err(ConfigError::InvalidLoad(self.max_load_percent));
        }

        for (field, value) in [
            ("symbol_size_class", self.symbol_size_class),
            ("term_size_class", self.term_size_class),
        ] {
            if value > self.max_size_class {
                return Err(ConfigError::SizeClassTooLarge {
                    field,
                    value,
                    max: self.max_size_class,
                });
            }
        }

        Ok(())
    }

    /// Returns the parameters of the symbol table.
    pub(crate) fn symbol_table(&self) -> TableConfig {
        TableConfig {
            size_class: self.symbol_size_class,
            max_size_class: self.max_size_class,
            max_load_percent: self.max_load_percent,
        }
    }

    /// Returns the parameters of the term table.
    pub(crate) fn term_table(&self) -> TableConfig {
        TableConfig {
            size_class: self.term_size_class,
            max_size_class: self.max_size_class,
            max_load_percent: self.max_load_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.symbol_table().size_class, 14);
        assert_eq!(config.term_table().size_class, 17);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = StoreConfig::from_toml_str("symbol_size_class = 4\nmax_load_percent = 50\n").unwrap();

        assert_eq!(
            config,
            StoreConfig {
                symbol_size_class: 4,
                max_load_percent: 50,
                ..StoreConfig::default()
            }
        );
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            StoreConfig::from_toml_str("max_load_percent = 0"),
            Err(ConfigError::InvalidLoad(0))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("max_size_class = 40"),
            Err(ConfigError::MaxSizeClassTooLarge(40))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("max_size_class = 10"),
            Err(ConfigError::SizeClassTooLarge {
                field: "symbol_size_class",
                value: 14,
                max: 10
            })
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("term_classes = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_for_capacities() {
        let config = StoreConfig::for_capacities(100, 100_000);
        assert_eq!(config.symbol_size_class, 7);
        assert_eq!(config.term_size_class, 17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "term_size_class = 8").unwrap();

        let config = StoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.term_size_class, 8);

        let missing = StoreConfig::from_file(file.path().with_extension("missing"));
        let error = missing.expect_err("Reading a missing file should fail");
        assert!(error.downcast_ref::<std::io::Error>().is_some());
    }
}
