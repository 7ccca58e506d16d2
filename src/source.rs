//! Known data sources and their age-bucket tables.

use clap::ValueEnum;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// ICU hospitalizations by age group (MinCiencia producto 9).
pub const HOSPITALIZADOS_URL: &str = "https://raw.githubusercontent.com/MinCiencia/Datos-COVID19/master/output/producto9/HospitalizadosUCIEtario_std.csv";

/// Deaths by age group (MinCiencia producto 10).
pub const FALLECIDOS_URL: &str = "https://raw.githubusercontent.com/MinCiencia/Datos-COVID19/master/output/producto10/FallecidosEtario_std.csv";

static HOSPITALIZADOS_AGES: &[(&str, AgeBucket)] = &[
    ("<=39", AgeBucket::Under50),
    ("40-49", AgeBucket::Under50),
    ("50-59", AgeBucket::From50To69),
    ("60-69", AgeBucket::From50To69),
    (">=70", AgeBucket::Over70),
];

static FALLECIDOS_AGES: &[(&str, AgeBucket)] = &[
    ("<=39", AgeBucket::Under50),
    ("40-49", AgeBucket::Under50),
    ("50-59", AgeBucket::From50To69),
    ("60-69", AgeBucket::From50To69),
    ("70-79", AgeBucket::Over70),
    ("80-89", AgeBucket::Over70),
    (">=90", AgeBucket::Over70),
];

/// Identifies which published table a run is processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Hospitalizados,
    Fallecidos,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Hospitalizados, Source::Fallecidos];

    /// Upstream CSV location.
    pub fn url(&self) -> &'static str {
        match self {
            Source::Hospitalizados => HOSPITALIZADOS_URL,
            Source::Fallecidos => FALLECIDOS_URL,
        }
    }

    /// Directory name under the output root, also used as the file stem.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Source::Hospitalizados => "hospitalizados_etario",
            Source::Fallecidos => "fallecidos_etario",
        }
    }

    pub fn age_map(&self) -> &'static [(&'static str, AgeBucket)] {
        match self {
            Source::Hospitalizados => HOSPITALIZADOS_AGES,
            Source::Fallecidos => FALLECIDOS_AGES,
        }
    }

    /// Maps a raw `Grupo de edad` label to its bucket, if this source knows it.
    pub fn bucket_for(&self, raw_label: &str) -> Option<AgeBucket> {
        self.age_map()
            .iter()
            .find(|(label, _)| *label == raw_label)
            .map(|(_, bucket)| *bucket)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Coarse age group used in the reports.
///
/// Ordering follows the label text (`50-69` < `<50` < `>=70`), which is the
/// row order of the published tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBucket {
    Under50,
    From50To69,
    Over70,
}

impl AgeBucket {
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Under50 => "<50",
            AgeBucket::From50To69 => "50-69",
            AgeBucket::Over70 => ">=70",
        }
    }
}

impl Ord for AgeBucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}

impl PartialOrd for AgeBucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AgeBucket {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hospitalizados_map() {
        let s = Source::Hospitalizados;
        assert_eq!(s.bucket_for("<=39"), Some(AgeBucket::Under50));
        assert_eq!(s.bucket_for("40-49"), Some(AgeBucket::Under50));
        assert_eq!(s.bucket_for("60-69"), Some(AgeBucket::From50To69));
        assert_eq!(s.bucket_for(">=70"), Some(AgeBucket::Over70));
        assert_eq!(s.bucket_for("90-99"), None);
        assert_eq!(s.bucket_for("70-79"), None);
    }

    #[test]
    fn test_fallecidos_map() {
        let s = Source::Fallecidos;
        assert_eq!(s.bucket_for("70-79"), Some(AgeBucket::Over70));
        assert_eq!(s.bucket_for("80-89"), Some(AgeBucket::Over70));
        assert_eq!(s.bucket_for(">=90"), Some(AgeBucket::Over70));
        assert_eq!(s.bucket_for("50-59"), Some(AgeBucket::From50To69));
        assert_eq!(s.bucket_for(">=70"), None);
    }

    #[test]
    fn test_bucket_order_follows_labels() {
        let mut buckets = vec![AgeBucket::Over70, AgeBucket::Under50, AgeBucket::From50To69];
        buckets.sort();
        assert_eq!(
            buckets,
            vec![AgeBucket::From50To69, AgeBucket::Under50, AgeBucket::Over70]
        );
    }

    #[test]
    fn test_dir_names() {
        assert_eq!(Source::Hospitalizados.dir_name(), "hospitalizados_etario");
        assert_eq!(Source::Fallecidos.to_string(), "fallecidos_etario");
    }
}
