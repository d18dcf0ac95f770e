//! Word pairs and the built-in catalog.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// How close the two words of a pair are. Later rounds get closer pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Evil,
}

impl Difficulty {
    /// Rounds 1–3 are easy, 4–6 medium, 7–9 hard, and everything after evil.
    pub fn for_round(round: u32) -> Self {
        match round {
            0..=3 => Self::Easy,
            4..=6 => Self::Medium,
            7..=9 => Self::Hard,
            _ => Self::Evil,
        }
    }
}

/// The two words dealt in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    /// Dealt to the majority.
    pub main_word: String,
    /// Dealt to the imposters.
    pub imposter_word: String,
    pub difficulty: Difficulty,
    /// Identifies the pair regardless of which way round it was dealt.
    pub key: String,
}

/// Supplies a word pair at the start of each round.
///
/// `used` holds the keys of pairs already dealt this game. A provider
/// should avoid them while it has alternatives.
pub trait WordPairProvider: Send + Sync {
    fn next_pair(&self, round: u32, used: &[String], rng: &mut dyn RngCore) -> WordPair;
}

type Tier = &'static [(&'static str, &'static str)];

const EASY: Tier = &[
    ("Coffee", "Juice"),
    ("Dog", "Cat"),
    ("Guitar", "Drums"),
    ("Beach", "Mountain"),
    ("Pizza", "Burger"),
    ("Train", "Airplane"),
    ("Winter", "Summer"),
    ("Book", "Movie"),
    ("Sun", "Moon"),
    ("Bicycle", "Skateboard"),
];

const MEDIUM: Tier = &[
    ("Eagle", "Hawk"),
    ("Piano", "Keyboard"),
    ("Soccer", "Rugby"),
    ("Cake", "Pie"),
    ("River", "Stream"),
    ("Jacket", "Sweater"),
    ("Dolphin", "Porpoise"),
    ("Couch", "Recliner"),
    ("Painting", "Drawing"),
    ("Jogging", "Sprinting"),
];

const HARD: Tier = &[
    ("Butter", "Margarine"),
    ("Alligator", "Crocodile"),
    ("Violin", "Viola"),
    ("Lemon", "Lime"),
    ("Tornado", "Hurricane"),
    ("Sofa", "Loveseat"),
    ("Pancake", "Waffle"),
    ("Raven", "Crow"),
    ("Jelly", "Jam"),
    ("Hiking", "Trekking"),
];

const EVIL: Tier = &[
    ("Fog", "Mist"),
    ("Turtle", "Tortoise"),
    ("Emoji", "Emoticon"),
    ("Biscuit", "Cookie"),
    ("Noodles", "Pasta"),
    ("Pillow", "Cushion"),
    ("Cemetery", "Graveyard"),
    ("Scent", "Fragrance"),
    ("Clamp", "Clip"),
    ("Broth", "Stock"),
];

/// The default [`WordPairProvider`]: ten pairs in each difficulty tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCatalog;

impl WordCatalog {
    /// All pairs of a tier, in catalog orientation.
    pub fn tier(difficulty: Difficulty) -> &'static [(&'static str, &'static str)] {
        match difficulty {
            Difficulty::Easy => EASY,
            Difficulty::Medium => MEDIUM,
            Difficulty::Hard => HARD,
            Difficulty::Evil => EVIL,
        }
    }

    fn key(pair: &(&str, &str)) -> String {
        format!("{}/{}", pair.0, pair.1)
    }
}

impl WordPairProvider for WordCatalog {
    fn next_pair(&self, round: u32, used: &[String], rng: &mut dyn RngCore) -> WordPair {
        let difficulty = Difficulty::for_round(round);
        let tier = Self::tier(difficulty);

        let unused: Vec<&(&str, &str)> = tier
            .iter()
            .filter(|pair| !used.contains(&Self::key(pair)))
            .collect();
        // Once a tier is exhausted, repeats are allowed.
        let pool: Vec<&(&str, &str)> = if unused.is_empty() {
            tier.iter().collect()
        } else {
            unused
        };

        let &&(first, second) = pool.choose(rng).unwrap_or(&&tier[0]);
        let key = Self::key(&(first, second));
        let (main_word, imposter_word) = if rng.random_bool(0.5) {
            (second, first)
        } else {
            (first, second)
        };

        WordPair {
            main_word: main_word.to_string(),
            imposter_word: imposter_word.to_string(),
            difficulty,
            key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_difficulty_for_round_boundaries() {
        assert_eq!(Difficulty::for_round(1), Difficulty::Easy);
        assert_eq!(Difficulty::for_round(3), Difficulty::Easy);
        assert_eq!(Difficulty::for_round(4), Difficulty::Medium);
        assert_eq!(Difficulty::for_round(6), Difficulty::Medium);
        assert_eq!(Difficulty::for_round(7), Difficulty::Hard);
        assert_eq!(Difficulty::for_round(9), Difficulty::Hard);
        assert_eq!(Difficulty::for_round(10), Difficulty::Evil);
        assert_eq!(Difficulty::for_round(42), Difficulty::Evil);
    }

    #[test]
    fn test_catalog_tiers_have_ten_distinct_pairs() {
        for difficulty in [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Evil,
        ] {
            let tier = WordCatalog::tier(difficulty);
            assert_eq!(tier.len(), 10);
            assert!(tier.iter().all(|(a, b)| a != b));
        }
    }

    #[test]
    fn test_next_pair_skips_used_keys() {
        let mut rng = StdRng::seed_from_u64(1);
        let used: Vec<String> = EASY[1..].iter().map(WordCatalog::key).collect();

        for _ in 0..20 {
            let pair = WordCatalog.next_pair(2, &used, &mut rng);
            assert_eq!(pair.key, "Coffee/Juice");
        }
    }

    #[test]
    fn test_next_pair_exhausted_tier_falls_back() {
        let mut rng = StdRng::seed_from_u64(2);
        let used: Vec<String> = EASY.iter().map(WordCatalog::key).collect();

        let pair = WordCatalog.next_pair(1, &used, &mut rng);
        assert_eq!(pair.difficulty, Difficulty::Easy);
        assert!(used.contains(&pair.key));
    }

    #[test]
    fn test_next_pair_swaps_orientation_but_keeps_key() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut swapped = false;
        let mut straight = false;

        for _ in 0..64 {
            let pair = WordCatalog.next_pair(10, &[], &mut rng);
            assert_ne!(pair.main_word, pair.imposter_word);
            if pair.key == format!("{}/{}", pair.main_word, pair.imposter_word) {
                straight = true;
            } else {
                assert_eq!(pair.key, format!("{}/{}", pair.imposter_word, pair.main_word));
                swapped = true;
            }
        }
        assert!(swapped && straight);
    }
}
