use std::io;
use std::path::{Path, PathBuf};

use crate::schema::{EntitySchema, StagingArea};

/// Layout of the staging tree shared by the generator, enricher and loader.
///
/// ```text
/// <root>/raw/internal/   generated entities
/// <root>/raw/external/   enriched entities
/// <root>/processed/
/// <root>/staging/
/// ```
#[derive(Debug, Clone)]
pub struct StagingPaths {
    root: PathBuf,
}

impl StagingPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_internal(&self) -> PathBuf {
        self.root.join("raw").join("internal")
    }

    pub fn raw_external(&self) -> PathBuf {
        self.root.join("raw").join("external")
    }

    pub fn processed(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn staging(&self) -> PathBuf {
        self.root.join("staging")
    }

    pub fn area(&self, area: StagingArea) -> PathBuf {
        match area {
            StagingArea::Internal => self.raw_internal(),
            StagingArea::External => self.raw_external(),
        }
    }

    /// Location of the flat file for `schema`.
    pub fn entity_file(&self, schema: &EntitySchema) -> PathBuf {
        self.area(schema.area).join(schema.file_name)
    }

    /// Create every directory of the layout.
    pub fn ensure(&self) -> io::Result<()> {
        for dir in [
            self.raw_internal(),
            self.raw_external(),
            self.processed(),
            self.staging(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{TRANSACTIONS, WEATHER_OBSERVATIONS};

    #[test]
    fn entity_files_follow_their_area() {
        let paths = StagingPaths::new("/data");
        assert_eq!(
            paths.entity_file(&TRANSACTIONS),
            PathBuf::from("/data/raw/internal/transactions.csv")
        );
        assert_eq!(
            paths.entity_file(&WEATHER_OBSERVATIONS),
            PathBuf::from("/data/raw/external/weather_observations.csv")
        );
    }
}
