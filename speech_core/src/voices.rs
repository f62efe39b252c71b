use rand::Rng;
use serde::Serialize;

/// Prebuilt voices offered by the generation API, with their style tag.
/// Order matters: it is the sampling pool.
const CATALOG: [(&str, &str); 30] = [
    ("Zephyr", "Bright"),
    ("Puck", "Upbeat"),
    ("Charon", "Informative"),
    ("Kore", "Firm"),
    ("Fenrir", "Excitable"),
    ("Leda", "Youthful"),
    ("Orus", "Firm"),
    ("Aoede", "Breezy"),
    ("Callirrhoe", "Easy-going"),
    ("Autonoe", "Bright"),
    ("Enceladus", "Breathy"),
    ("Iapetus", "Clear"),
    ("Umbriel", "Easy-going"),
    ("Algieba", "Smooth"),
    ("Despina", "Smooth"),
    ("Erinome", "Clear"),
    ("Algenib", "Gravelly"),
    ("Rasalgethi", "Informative"),
    ("Laomedeia", "Upbeat"),
    ("Achernar", "Soft"),
    ("Alnilam", "Firm"),
    ("Schedar", "Even"),
    ("Gacrux", "Mature"),
    ("Pulcherrima", "Forward"),
    ("Achird", "Friendly"),
    ("Zubenelgenubi", "Casual"),
    ("Vindemiatrix", "Gentle"),
    ("Sadachbia", "Lively"),
    ("Sadaltager", "Knowledgeable"),
    ("Sulafat", "Warm"),
];

/// Number of voices in the catalog; also the most speakers a request can get.
pub const CATALOG_SIZE: usize = CATALOG.len();

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: &'static str,
    pub style: &'static str,
}

/// Voice names in catalog order.
pub fn voice_names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(name, _)| *name)
}

pub fn catalog() -> Vec<VoiceInfo> {
    CATALOG
        .iter()
        .map(|&(name, style)| VoiceInfo { name, style })
        .collect()
}

/// Draw `min(speaker_count, CATALOG_SIZE)` distinct voices, uniformly and in
/// random order. A count of zero still yields one voice.
pub fn select_voices<R: Rng + ?Sized>(rng: &mut R, speaker_count: usize) -> Vec<&'static str> {
    let amount = speaker_count.clamp(1, CATALOG_SIZE);
    rand::seq::index::sample(rng, CATALOG_SIZE, amount)
        .into_iter()
        .map(|i| CATALOG[i].0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_no_duplicates() {
        let names: HashSet<&str> = voice_names().collect();
        assert_eq!(names.len(), CATALOG_SIZE);
        assert_eq!(CATALOG_SIZE, 30);
        assert_eq!(catalog()[0], VoiceInfo { name: "Zephyr", style: "Bright" });
    }

    #[test]
    fn test_select_distinct_voices_for_every_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let all: HashSet<&str> = voice_names().collect();
        for n in 1..=CATALOG_SIZE {
            let picked = select_voices(&mut rng, n);
            assert_eq!(picked.len(), n);
            let unique: HashSet<&str> = picked.iter().copied().collect();
            assert_eq!(unique.len(), n, "duplicate voice for n={n}");
            assert!(unique.is_subset(&all));
        }
    }

    #[test]
    fn test_select_caps_at_catalog_size() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in [31, 45, 1000] {
            let picked = select_voices(&mut rng, n);
            assert_eq!(picked.len(), CATALOG_SIZE);
            let unique: HashSet<&str> = picked.into_iter().collect();
            assert_eq!(unique.len(), CATALOG_SIZE);
        }
    }

    #[test]
    fn test_select_zero_yields_one_voice() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(select_voices(&mut rng, 0).len(), 1);
    }

    #[test]
    fn test_seeded_selection_is_deterministic() {
        let a = select_voices(&mut StdRng::seed_from_u64(42), 5);
        let b = select_voices(&mut StdRng::seed_from_u64(42), 5);
        assert_eq!(a, b);
    }
}
