use crate::normalizer::SubletPolicy;
use std::collections::HashSet;
use tracing::warn;

/// Suffix marking a name that stands for every region of a group, e.g. "Zurich (ALL)"
const ALL_SUFFIX: &str = " (ALL)";

/// Search parameters for room scraping
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    /// City names as shown on the site, or "<Group> (ALL)"
    pub regions: Vec<String>,
    /// Minimum monthly rent (CHF)
    pub min_price: Option<u32>,
    /// Maximum monthly rent (CHF)
    pub max_price: Option<u32>,
    pub sublets: SubletPolicy,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            regions: vec!["Zurich (ALL)".to_string()],
            min_price: Some(200),
            max_price: Some(750),
            sublets: SubletPolicy::default(),
        }
    }
}

/// A concrete region as the target site knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub code: String,
    pub name: String,
}

/// Lookup from human-readable region names to site codes
#[derive(Debug, Clone)]
pub struct RegionTable {
    entries: Vec<Region>,
}

impl RegionTable {
    pub fn new<N, C>(entries: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, code)| Region {
                    name: name.into(),
                    code: code.into(),
                })
                .collect(),
        }
    }

    /// Regions offered by wgzimmer.ch
    pub fn wgzimmer() -> Self {
        Self::new(WGZIMMER_REGIONS.iter().copied())
    }

    pub fn by_name(&self, name: &str) -> Option<&Region> {
        self.entries.iter().find(|r| r.name == name)
    }

    /// Every region whose code is `group` or starts with `group-`
    fn group(&self, group: &str) -> impl Iterator<Item = &Region> {
        let prefix = format!("{group}-");
        let group = group.to_string();
        self.entries
            .iter()
            .filter(move |r| r.code == group || r.code.starts_with(&prefix))
    }

    /// Resolve configured names into distinct regions, keeping first-seen order.
    ///
    /// Unknown names are skipped with a warning.
    pub fn resolve(&self, names: &[String]) -> Vec<Region> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for name in names {
            let matches: Vec<&Region> = match name.strip_suffix(ALL_SUFFIX) {
                Some(group) => self.group(&group.trim().to_lowercase()).collect(),
                None => self.by_name(name).into_iter().collect(),
            };

            if matches.is_empty() {
                warn!("'{}' is not a known region name. Skipping.", name);
                continue;
            }

            for region in matches {
                if seen.insert(region.code.clone()) {
                    resolved.push(region.clone());
                }
            }
        }

        resolved
    }
}

const WGZIMMER_REGIONS: &[(&str, &str)] = &[
    ("Aargau", "aargau"),
    ("Aarau (Stadt)", "aarau"),
    ("Appenzell Innerrhoden", "appenzell-innerrhoden"),
    ("Appenzell Ausser.", "appenzell-ausser"),
    ("Baden", "baden"),
    ("Basel City", "baselstadt"),
    ("Basel Land", "baselland"),
    ("Bern", "bern"),
    ("Biel", "biel"),
    ("Brugg", "brugg"),
    ("Burgdorf", "burgdorf"),
    ("Chur", "chur"),
    ("Emmental", "emmental"),
    ("Frauenfeld", "frauenfeld"),
    ("Fribourg", "fribourg"),
    ("Jura", "jura"),
    ("Geneva", "genf"),
    ("Glarus", "glarus"),
    ("Graubünden", "graubunden"),
    ("Interlaken", "interlaken"),
    ("Kloten (Zürich)", "zurich-kloten"),
    ("Langenthal", "langenthal"),
    ("Langnau", "langnau"),
    ("Laufenburg", "laufenburg"),
    ("Lausanne", "lausanne"),
    ("Lörrach (DE)", "loerrach"),
    ("Lucerne", "luzern"),
    ("Neuchâtel", "neuenburg"),
    ("Nidwalden", "nidwalden"),
    ("Obwalden", "obwalden"),
    ("Olten", "olten"),
    ("Ostschweiz", "ostschweiz"),
    ("Rapperswil-Jona", "rapperswil-jona"),
    ("Schaffhausen", "schaffhausen"),
    ("Solothurn", "solothurn"),
    ("Schwyz", "schwyz"),
    ("Spiez", "spiez"),
    ("St. Gallen", "st-gallen"),
    ("Saint-Louis (FR)", "saint-louis-fr"),
    ("Simmental/Saanenland", "simmental-saanenland"),
    ("Ticino", "tessin"),
    ("Thun", "thun"),
    ("Thurgau", "thurgau"),
    ("Uri", "uri"),
    ("Vaud", "waadt"),
    ("Wädenswil (ZHAW)", "waedenswil"),
    ("Wallis", "wallis"),
    ("Weil am Rhein (DE)", "weil-am-rhein-de"),
    ("Wil", "wil"),
    ("Winterthur & Agglomeration", "winterthur"),
    ("Zug", "zug"),
    ("Zurich (City)", "zurich-stadt"),
    ("Zürich (Altstetten, Höngg)", "zurich-altstetten"),
    ("Zürich (Oerlikon, Seebach, Affoltern)", "zurich-oerlikon"),
    ("Zürich (Rund um den See)", "zurich-lake"),
    ("Zürich (Aeugstertal, Affoltern am Albis)", "zurich-aeugstertal"),
    ("Zurich (Unterland, Weinland, Limmattal)", "zurich"),
    ("Zürich (Oberland, Glattal)", "zurich-oberland"),
    ("Liechtenstein", "liechtenstein"),
];
